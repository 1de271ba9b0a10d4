use super::AsTargets;
use ndarray::{ArrayBase, ArrayView1, Data, Ix1};

/// A one-dimensional NdArray can act as targets
impl<L, S: Data<Elem = L>> AsTargets for ArrayBase<S, Ix1> {
    type Elem = L;

    fn as_targets(&self) -> ArrayView1<'_, L> {
        self.view()
    }
}

impl<T: AsTargets> AsTargets for &T {
    type Elem = T::Elem;

    fn as_targets(&self) -> ArrayView1<'_, Self::Elem> {
        (*self).as_targets()
    }
}
