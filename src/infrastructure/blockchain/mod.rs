//! EVM contract access for voting power and votes

pub mod contracts;
pub mod voter_client;

pub use contracts::{ContractAddresses, DEFAULT_RPC_URL};
pub use voter_client::{get_current_votes, HydrexChainClient, VoteChain, VoterReader};
