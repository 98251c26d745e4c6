//! Definitions of Solidity functions called during deployment

use alloy_sol_types::sol;

sol! {
    /// The Balloons ERC20 token
    interface IBalloons {
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 value) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 value) external returns (bool);
        function transferFrom(address from, address to, uint256 value) external returns (bool);
    }

    /// The Balloons / ether exchange
    interface IDex {
        function token() external view returns (address);
        function totalLiquidity() external view returns (uint256);
        function liquidity(address provider) external view returns (uint256);
        function init(uint256 tokens) external payable returns (uint256);
    }
}
