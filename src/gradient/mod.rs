pub(crate) mod curve;
pub(crate) mod spec;
pub(crate) mod strength_map;
