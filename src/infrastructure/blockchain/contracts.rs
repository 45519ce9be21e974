//! Contract bindings for the voting escrow, the voter and Multicall3

use alloy::primitives::{address, Address};
use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IVotingEscrow {
        function getPastVotes(address account, uint256 timestamp) external view returns (uint256);
    }
}

sol! {
    #[sol(rpc)]
    interface IVoter {
        function vote(address[] calldata poolVote, uint256[] calldata weights) external;
        function poolVoteLength(address user) external view returns (uint256);
        function poolVote(address user, uint256 index) external view returns (address);
        function votes(address user, address pool) external view returns (uint256);
    }
}

// Multicall3 contract interface
sol! {
    #[sol(rpc)]
    contract Multicall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        struct Result {
            bool success;
            bytes returnData;
        }

        function aggregate3(Call3[] calldata calls) external payable returns (Result[] memory returnData);
    }
}

/// Hydrex voting escrow on Base
pub const VOTING_ESCROW_ADDRESS: Address = address!("25B2ED7149fb8A05f6eF9407d9c8F878f59cd1e1");

/// Hydrex voter on Base
pub const VOTER_ADDRESS: Address = address!("c69E3eF39E3fFBcE2A1c570f8d3ADF76909ef17b");

// Multicall3 address (same on all EVM chains)
pub const MULTICALL3_ADDRESS: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");

pub const DEFAULT_RPC_URL: &str = "https://mainnet.base.org";

/// Addresses the chain client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    pub voting_escrow: Address,
    pub voter: Address,
    pub multicall: Address,
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self {
            voting_escrow: VOTING_ESCROW_ADDRESS,
            voter: VOTER_ADDRESS,
            multicall: MULTICALL3_ADDRESS,
        }
    }
}
