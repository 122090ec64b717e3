use std::sync::Arc;

use crate::context::ServiceContext;
use crate::embedding::Embedder;
use crate::store::RecordStore;

pub struct HandlerState<E, S> {
    pub context: Arc<ServiceContext<E, S>>,
}

impl<E, S> Clone for HandlerState<E, S> {
    fn clone(&self) -> Self {
        Self {
            context: Arc::clone(&self.context),
        }
    }
}

impl<E, S> HandlerState<E, S>
where
    E: Embedder + 'static,
    S: RecordStore + 'static,
{
    pub fn new(context: Arc<ServiceContext<E, S>>) -> Self {
        Self { context }
    }

    pub fn from_context(context: ServiceContext<E, S>) -> Self {
        Self::new(Arc::new(context))
    }
}
