// src/socket/patterns/mod.rs

//! The multiplexing and subscription primitives the socket patterns are
//! composed from.

pub mod distributor;
pub mod fair_queue;
pub mod load_balancer;
pub mod multi_trie;
pub mod trie;

pub use distributor::Distributor;
pub use fair_queue::FairQueue;
pub use load_balancer::LoadBalancer;
pub use multi_trie::MultiTrie;
pub use trie::SubscriptionTrie;
