use std::{iter::Rev, mem, slice};

/// Walks a flat parameter buffer layer by layer, from the first layer to the last.
pub struct FrontIter<'a> {
    params: &'a [f32],
    layer_sizes: slice::Iter<'a, usize>,
}

impl<'a> FrontIter<'a> {
    /// Creates a new `FrontIter`.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `layer_sizes` - The amount of parameters of each layer, in order.
    pub fn new(params: &'a [f32], layer_sizes: &'a [usize]) -> Self {
        Self {
            params,
            layer_sizes: layer_sizes.iter(),
        }
    }
}

impl<'a> Iterator for FrontIter<'a> {
    type Item = &'a [f32];

    fn next(&mut self) -> Option<Self::Item> {
        let &size = self.layer_sizes.next()?;
        let (head, tail) = self.params.split_at_checked(size)?;
        self.params = tail;
        Some(head)
    }
}

/// Walks a flat parameter buffer and its gradient layer by layer, from the last layer to the
/// first.
pub struct BackIter<'a> {
    params: &'a [f32],
    grad: &'a mut [f32],
    layer_sizes: Rev<slice::Iter<'a, usize>>,
}

impl<'a> BackIter<'a> {
    /// Creates a new `BackIter`.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `grad` - The gradient buffer, laid out like `params`.
    /// * `layer_sizes` - The amount of parameters of each layer, in forward order.
    pub fn new(params: &'a [f32], grad: &'a mut [f32], layer_sizes: &'a [usize]) -> Self {
        Self {
            params,
            grad,
            layer_sizes: layer_sizes.iter().rev(),
        }
    }
}

impl<'a> Iterator for BackIter<'a> {
    type Item = (&'a [f32], &'a mut [f32]);

    fn next(&mut self) -> Option<Self::Item> {
        let &size = self.layer_sizes.next()?;
        let at = self.params.len().checked_sub(size)?;
        if self.grad.len() != self.params.len() {
            return None;
        }

        let (params_rest, params) = self.params.split_at(at);
        let (grad_rest, grad) = mem::take(&mut self.grad).split_at_mut(at);
        self.params = params_rest;
        self.grad = grad_rest;

        Some((params, grad))
    }
}
