//! RabbitMQ adapters - broker topology, publisher and consumer loop.

mod consumer;
mod publisher;
mod topology;

pub use consumer::run_consumer;
pub use publisher::RabbitEventPublisher;
pub use topology::{connect, declare_topology, dlq_name};
