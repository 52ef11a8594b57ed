pub(crate) mod gaussian;
pub(crate) mod pass;
pub(crate) mod program;
