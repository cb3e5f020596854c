mod errors;

pub use errors::Error;

pub type VomadridResult<T> = Result<T, Error>;
