//! Minimal bindings for the slice of the input-box ABI this worker
//! consumes. A full ABI runtime is not needed: one event and the
//! `EvmAdvance` calldata framing cover everything.

use alloy::sol;

sol! {
    /// Emitted by the input box for every input, in index order.
    #[derive(Debug)]
    event InputAdded(address indexed appContract, uint256 indexed index, bytes input);

    /// Calldata framing the input box wraps around every advance.
    #[derive(Debug)]
    function EvmAdvance(
        uint256 chainId,
        address appContract,
        address msgSender,
        uint256 blockNumber,
        uint256 blockTimestamp,
        uint256 prevRandao,
        uint256 index,
        bytes payload
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, Bytes, U256};
    use alloy::sol_types::SolCall;

    #[test]
    fn evm_advance_decodes_sender_and_payload() {
        let call = EvmAdvanceCall {
            chainId: U256::from(31337u64),
            appContract: Address::repeat_byte(0xab),
            msgSender: "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
                .parse()
                .unwrap(),
            blockNumber: U256::from(12u64),
            blockTimestamp: U256::from(1_700_000_000u64),
            prevRandao: U256::from(99u64),
            index: U256::from(0u64),
            payload: Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]),
        };
        let encoded = call.abi_encode();
        let decoded = EvmAdvanceCall::abi_decode(&encoded).unwrap();
        assert_eq!(decoded.msgSender, call.msgSender);
        assert_eq!(decoded.payload, call.payload);
        assert_eq!(decoded.prevRandao, call.prevRandao);
    }
}
