use crate::error::Bme280Error;
use std::{error, fmt};

impl<E: fmt::Debug> error::Error for Bme280Error<E> {}
