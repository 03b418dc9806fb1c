pub mod exponential_decay;
