use super::*;

mod promise;
mod scheduler;
