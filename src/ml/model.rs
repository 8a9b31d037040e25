use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig, Relu},
    prelude::*,
};

#[derive(Config, Debug)]
pub struct VolumeRegressorConfig {
    pub input_dim: usize,
    #[config(default = "vec![128, 64, 32]")]
    pub hidden:    Vec<usize>,
    #[config(default = 0.2)]
    pub dropout:   f64,
}

impl VolumeRegressorConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> VolumeRegressorModel<B> {
        let mut d_in = self.input_dim;
        let mut layers = Vec::with_capacity(self.hidden.len());
        for &d_out in &self.hidden {
            layers.push(LinearConfig::new(d_in, d_out).init(device));
            d_in = d_out;
        }
        let head    = LinearConfig::new(d_in, 1).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        VolumeRegressorModel {
            layers,
            head,
            dropout,
            activation: Relu::new(),
            input_dim:  self.input_dim,
        }
    }
}

/// Fully connected ReLU stack with a single linear output.
#[derive(Module, Debug)]
pub struct VolumeRegressorModel<B: Backend> {
    pub layers:     Vec<Linear<B>>,
    pub head:       Linear<B>,
    pub dropout:    Dropout,
    pub activation: Relu,
    pub input_dim:  usize,
}

impl<B: Backend> VolumeRegressorModel<B> {
    /// features: [batch, input_dim] → predictions: [batch, 1]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut x = features;
        for layer in &self.layers {
            x = self.dropout.forward(self.activation.forward(layer.forward(x)));
        }
        self.head.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_forward_shape() {
        let _guard = crate::ml::trainer::backend_lock();
        let device = Default::default();
        let model: VolumeRegressorModel<TestBackend> =
            VolumeRegressorConfig::new(25).with_hidden(vec![8, 4]).init(&device);
        let x = Tensor::<TestBackend, 2>::zeros([3, 25], &device);
        assert_eq!(model.forward(x).dims(), [3, 1]);
        assert_eq!(model.layers.len(), 2);
    }
}
