use crate::activator::Activator;

use ndarray::{Array1, Array2, ArrayView1, Axis};

/// A borrowed view of a single layer of the neural network
///
/// The network owns its parameters as whole arrays so that past snapshots
/// stay valid; a `Layer` ties one weight matrix, bias vector and activation
/// function together for the duration of a pass.
#[derive(Copy, Clone, Debug)]
pub struct Layer<'a> {
    /// The activation function to be used for every neuron in the layer.
    pub activator: Activator,
    /// The layer weights, with each neuron's weights stored as a row.
    pub weights: &'a Array2<f64>,
    /// One bias per neuron.
    pub biases: &'a Array1<f64>,
}

/// The gradients a layer produces during backpropagation.
#[derive(Clone, Debug)]
pub struct LayerGradient {
    /// `dC/dW`, shaped like the layer's weight matrix.
    pub weights: Array2<f64>,
    /// `dC/db`, equal to `dC/dz`.
    pub biases: Array1<f64>,
    /// `dC/da` for the previous layer's activations.
    pub input_errors: Array1<f64>,
}

impl<'a> Layer<'a> {
    /// Returns the number of inputs to this layer.
    pub fn input_len(&self) -> usize {
        self.weights.ncols()
    }

    /// Returns the number of outputs from this layer.
    pub fn output_len(&self) -> usize {
        self.weights.nrows()
    }

    /// Feeds the provided `inputs` forward through the layer, returning the
    /// pre-activation `z = W·a + b` and the activation `f(z)`.
    pub fn forward(&self, inputs: ArrayView1<f64>) -> (Array1<f64>, Array1<f64>) {
        assert_eq!(inputs.len(), self.input_len());
        let z = self.weights.dot(&inputs) + self.biases;
        let a = self.activator.apply(&z);
        (z, a)
    }

    /// Feeds the provided `output_errors` (`dC/da` at this layer) backwards
    /// through the layer.
    ///
    /// Arguments:
    ///
    ///  * `inputs` - the activations that were fed into this layer.
    ///  * `z` - the pre-activation values computed by `forward`.
    ///  * `output_errors` - the cost gradient with respect to this layer's
    ///                      activations.
    pub fn backward(&self,
                    inputs: ArrayView1<f64>,
                    z: ArrayView1<f64>,
                    output_errors: ArrayView1<f64>)
                    -> LayerGradient {
        assert_eq!(inputs.len(), self.input_len());
        assert_eq!(z.len(), self.output_len());
        assert_eq!(output_errors.len(), self.output_len());
        let dz = self.activator.derivatives(&z) * &output_errors;
        let weights = dz.view()
            .insert_axis(Axis(1))
            .dot(&inputs.insert_axis(Axis(0)));
        let input_errors = self.weights.t().dot(&dz);
        LayerGradient {
            weights,
            biases: dz,
            input_errors,
        }
    }
}
