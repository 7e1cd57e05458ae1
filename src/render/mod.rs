pub(crate) mod parallel;
pub(crate) mod pipeline;
pub(crate) mod scratch;
