// Swipe-to-pay: USDC transfer requests, confirmation and verification on Base

pub mod chain;
pub mod flow;
pub mod service;
pub mod tracker;
pub mod usdc;
pub mod view;

pub use chain::{ChainClient, EthersChainClient};
pub use flow::{PaymentFlow, PaymentPhase, SwipeOutcome};
pub use service::*;
pub use tracker::PaymentTracker;
pub use view::{payment_panel, PaymentPanel};
