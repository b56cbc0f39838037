mod interaction;
mod render;

pub(super) use interaction::{InteractionState, NodeDetailSink};
