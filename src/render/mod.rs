pub(crate) mod frame;
pub(crate) mod orchestrator;
pub(crate) mod pipeline;
pub(crate) mod source;
