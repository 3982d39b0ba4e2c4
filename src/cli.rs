//! Command-line argument structures for host binaries.
//!
//! The collector core owns two flags; a host binary flattens
//! [`CollectorFlags`] into its own argument struct and converts them into
//! [`ScrapeOptions`].

use crate::scrape::ScrapeOptions;
use clap::ArgAction;

/// Flags owned by the collector core.
#[derive(Debug, Clone, clap::Args)]
pub struct CollectorFlags {
    /// Wrap 64-bit counters to avoid floating point rounding.
    #[arg(
        long = "snmp.wrap-large-counters",
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub wrap_large_counters: bool,

    /// Source address to send snmp from in the format 'address:port' to use
    /// when connecting targets. If the port parameter is empty or '0', as in
    /// '127.0.0.1:' or '[::1]:0', a source port number is automatically
    /// (random) chosen.
    #[arg(long = "snmp.source-address", default_value = "")]
    pub source_address: String,
}

impl CollectorFlags {
    /// Convert the flags into scrape options.
    pub fn scrape_options(&self) -> ScrapeOptions {
        ScrapeOptions {
            wrap_counters: self.wrap_large_counters,
            source_address: if self.source_address.is_empty() {
                None
            } else {
                Some(self.source_address.clone())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        collector: CollectorFlags,
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::parse_from(["test"]);
        let options = cli.collector.scrape_options();
        assert!(options.wrap_counters);
        assert!(options.source_address.is_none());
    }

    #[test]
    fn test_disable_wrap() {
        let cli = TestCli::parse_from(["test", "--snmp.wrap-large-counters=false"]);
        assert!(!cli.collector.scrape_options().wrap_counters);
    }

    #[test]
    fn test_source_address() {
        let cli = TestCli::parse_from(["test", "--snmp.source-address", "127.0.0.1:0"]);
        assert_eq!(
            cli.collector.scrape_options().source_address.as_deref(),
            Some("127.0.0.1:0")
        );
    }
}
