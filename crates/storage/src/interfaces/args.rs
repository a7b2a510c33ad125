use clap::Parser;
use derive_builder::Builder;

#[derive(Debug, Clone, Parser, Builder)]
#[clap(
    about = "Read and decode a range of a contract's storage slots",
    override_usage = "slotscope inspect <TARGET> [OPTIONS]"
)]
/// Arguments for the inspect operation
///
/// This struct contains all the parameters needed to read a range of storage slots
/// of a single contract without going through the HTTP server.
pub struct InspectArgs {
    /// The address of the contract to inspect.
    #[clap(required = true)]
    pub target: String,

    /// The chain the contract is deployed on.
    #[clap(long = "chain-id", short = 'c', default_value = "1")]
    pub chain_id: u64,

    /// The first slot to read.
    #[clap(long, short, default_value = "0", allow_negative_numbers = true)]
    pub start: i64,

    /// The last slot to read, inclusive.
    #[clap(long, short, default_value = "255", allow_negative_numbers = true)]
    pub end: i64,

    /// The block to read at: a tag such as 'latest' or 'finalized', or a block number.
    #[clap(long = "block-tag", short, default_value = "latest")]
    pub block_tag: String,

    /// The RPC URL to use for this chain, overriding the configured endpoint.
    #[clap(long, short, default_value = "", hide_default_value = true)]
    pub rpc_url: String,

    /// The base URL of the contract metadata API, overriding the configured one.
    #[clap(long = "metadata-url", default_value = "", hide_default_value = true)]
    pub metadata_url: String,

    /// The output directory to write the JSON output to, or 'print' to print to the console.
    #[clap(long = "output", short, default_value = "print", hide_default_value = true)]
    pub output: String,
}

impl InspectArgsBuilder {
    /// Creates a new InspectArgsBuilder with default values
    pub fn new() -> Self {
        Self {
            target: Some(String::new()),
            chain_id: Some(1),
            start: Some(0),
            end: Some(255),
            block_tag: Some(String::from("latest")),
            rpc_url: Some(String::new()),
            metadata_url: Some(String::new()),
            output: Some(String::from("print")),
        }
    }
}

impl InspectArgs {
    /// The storage query these arguments describe.
    pub fn query(&self) -> StorageQuery {
        StorageQuery {
            address: self.target.clone(),
            chain_id: self.chain_id,
            start: self.start,
            end: self.end,
            block_tag: self.block_tag.clone(),
        }
    }
}

/// A request for a range of storage slots, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct StorageQuery {
    /// The contract address, `0x` followed by 40 hex characters in any case
    #[builder(setter(into))]
    pub address: String,
    /// EIP-155 chain id
    #[builder(default = "1")]
    pub chain_id: u64,
    /// First slot, inclusive. Negative values are rejected by validation
    #[builder(default = "0")]
    pub start: i64,
    /// Last slot, inclusive
    #[builder(default = "255")]
    pub end: i64,
    /// A named tag, a decimal height or a `0x` hex height
    #[builder(setter(into), default = "String::from(\"latest\")")]
    pub block_tag: String,
}

impl StorageQuery {
    /// A query for the default range (slots 0 to 255 on chain 1 at the latest block).
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            chain_id: 1,
            start: 0,
            end: 255,
            block_tag: String::from("latest"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_args_defaults() {
        let args = InspectArgs::parse_from(["inspect", "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"]);

        assert_eq!(args.chain_id, 1);
        assert_eq!(args.start, 0);
        assert_eq!(args.end, 255);
        assert_eq!(args.block_tag, "latest");
        assert_eq!(args.output, "print");
        assert_eq!(args.query(), StorageQuery::new("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"));
    }

    #[test]
    fn test_inspect_args_builder() {
        let args = InspectArgsBuilder::new()
            .target(String::from("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"))
            .end(5)
            .build()
            .expect("failed to build args");

        assert_eq!(args.query().end, 5);
        assert_eq!(args.query().start, 0);
    }

    #[test]
    fn test_storage_query_builder_defaults() {
        let query = StorageQueryBuilder::default()
            .address("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2")
            .start(10)
            .build()
            .expect("failed to build query");

        assert_eq!(query.chain_id, 1);
        assert_eq!(query.start, 10);
        assert_eq!(query.end, 255);
        assert_eq!(query.block_tag, "latest");
    }
}
