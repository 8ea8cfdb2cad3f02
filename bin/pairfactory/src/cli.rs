use std::{fmt, path::PathBuf};

use alloy_core::primitives::Address;
use clap::{Args, Parser, Subcommand};
use pairfactory_deploy::{CONFIG_FILENAME, DEFAULT_RPC_URL, DeployConfig};
use tracing::level_filters::LevelFilter;

/// Target network. Well-known networks come with a public RPC endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Network {
    Development,
    Sepolia,
    Mainnet,
    #[strum(default)]
    Custom(String),
}

impl Network {
    pub fn name(&self) -> &str {
        match self {
            Network::Development => "development",
            Network::Sepolia => "sepolia",
            Network::Mainnet => "mainnet",
            Network::Custom(name) => name,
        }
    }

    pub fn default_rpc_url(&self) -> Option<&'static str> {
        match self {
            Network::Development => Some(DEFAULT_RPC_URL),
            Network::Sepolia => Some("https://ethereum-sepolia-rpc.publicnode.com"),
            Network::Mainnet => Some("https://ethereum-mainnet-rpc.publicnode.com"),
            Network::Custom(_) => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Parser)]
#[command(name = "pairfactory")]
#[command(
    author,
    version,
    about = "Deploy a DEX pair factory and report the pair init code hash"
)]
pub struct Cli {
    /// The verbosity level. Logs go to stderr.
    #[arg(short, long, env = "PAIRFACTORY_VERBOSITY", default_value_t = LevelFilter::INFO, global = true)]
    pub verbosity: LevelFilter,

    /// Path to a Pairfactory.toml configuration file (or a directory containing one).
    ///
    /// Command line arguments override values from the file.
    #[arg(long, alias = "conf", env = "PAIRFACTORY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Deploy the factory (once per network) and print the deployment record.
    Deploy(DeployArgs),
    /// Set the factory's protocol fee recipient. Never run as part of `deploy`.
    SetFeeTo(SetFeeToArgs),
    /// Print the pair init code hash without contacting a node.
    InitCodeHash(ArtifactArgs),
    /// Write the effective configuration to a TOML file.
    SaveConfig(SaveConfigArgs),
}

/// Network, account and transaction settings shared by the commands.
#[derive(Debug, Clone, Args)]
pub struct NetworkArgs {
    /// Network name, used as the deployment registry key.
    #[arg(short, long, visible_alias = "name", env = "PAIRFACTORY_NETWORK")]
    pub network: Option<Network>,

    /// The URL of the JSON-RPC endpoint.
    ///
    /// Defaults to the public endpoint of a well-known network.
    #[arg(long, alias = "rpc", env = "PAIRFACTORY_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Accounts available for the deployment roles.
    ///
    /// If not provided, the node's `eth_accounts` are used.
    #[arg(long = "account", env = "PAIRFACTORY_ACCOUNTS", value_delimiter = ',')]
    pub accounts: Vec<Address>,

    /// Account sending the construction transaction. Defaults to the first available account.
    #[arg(long, env = "PAIRFACTORY_DEPLOYER")]
    pub deployer: Option<Address>,

    /// Account set as the factory's feeToSetter. Defaults to the first available account.
    #[arg(long, env = "PAIRFACTORY_FEE_TO_SETTER")]
    pub fee_to_setter: Option<Address>,

    /// Path to the deployment registry file.
    #[arg(long, env = "PAIRFACTORY_REGISTRY")]
    pub registry: Option<PathBuf>,

    /// Gas limit for transactions. Estimated by the node if not provided.
    #[arg(long, env = "PAIRFACTORY_GAS")]
    pub gas: Option<u64>,

    /// Seconds to wait for a transaction to be mined.
    #[arg(long, env = "PAIRFACTORY_CONFIRMATION_TIMEOUT")]
    pub confirmation_timeout: Option<u64>,
}

impl NetworkArgs {
    /// Override `config` with the arguments that were provided.
    pub fn apply(&self, config: &mut DeployConfig) {
        if let Some(network) = &self.network {
            config.network = network.name().to_string();
        }

        if let Some(rpc_url) = &self.rpc_url {
            config.rpc_url = rpc_url.clone();
        } else if let Some(rpc_url) = self.network.as_ref().and_then(Network::default_rpc_url) {
            config.rpc_url = rpc_url.to_string();
        }

        if !self.accounts.is_empty() {
            config.accounts = self.accounts.clone();
        }

        if self.deployer.is_some() {
            config.roles.deployer = self.deployer;
        }

        if self.fee_to_setter.is_some() {
            config.roles.fee_to_setter = self.fee_to_setter;
        }

        if let Some(registry) = &self.registry {
            config.registry_path = registry.clone();
        }

        if self.gas.is_some() {
            config.gas = self.gas;
        }

        if let Some(timeout) = self.confirmation_timeout {
            config.confirmation.timeout_secs = timeout;
        }
    }
}

/// Compiled artifact locations.
#[derive(Debug, Clone, Args)]
pub struct ArtifactArgs {
    /// Path to the factory artifact JSON.
    #[arg(long, env = "PAIRFACTORY_FACTORY_ARTIFACT")]
    pub factory_artifact: Option<PathBuf>,

    /// Path to the pair artifact JSON.
    #[arg(long, env = "PAIRFACTORY_PAIR_ARTIFACT")]
    pub pair_artifact: Option<PathBuf>,
}

impl ArtifactArgs {
    pub fn apply(&self, config: &mut DeployConfig) {
        if let Some(factory) = &self.factory_artifact {
            config.artifacts.factory = factory.clone();
        }
        if let Some(pair) = &self.pair_artifact {
            config.artifacts.pair = pair.clone();
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct DeployArgs {
    #[command(flatten)]
    pub network: NetworkArgs,

    #[command(flatten)]
    pub artifacts: ArtifactArgs,

    /// Deploy a new factory even if one is recorded for the network.
    /// If not provided and the network has a recorded factory, it is reused.
    #[arg(long, env = "PAIRFACTORY_REDEPLOY", default_value_t = false)]
    pub redeploy: bool,

    /// Print the record without asserting that feeToSetter is the intended account.
    #[arg(long)]
    pub no_verify: bool,
}

#[derive(Debug, Clone, Args)]
pub struct SetFeeToArgs {
    #[command(flatten)]
    pub network: NetworkArgs,

    /// The new protocol fee recipient.
    #[arg(long, env = "PAIRFACTORY_FEE_TO")]
    pub fee_to: Address,
}

#[derive(Debug, Clone, Args)]
pub struct SaveConfigArgs {
    #[command(flatten)]
    pub network: NetworkArgs,

    #[command(flatten)]
    pub artifacts: ArtifactArgs,

    /// Where to write the configuration.
    #[arg(long, short, default_value = CONFIG_FILENAME)]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_network_parsing() {
        assert_eq!(Network::from_str("sepolia").unwrap(), Network::Sepolia);
        assert_eq!(
            Network::from_str("my-devnet").unwrap(),
            Network::Custom("my-devnet".to_string())
        );
        assert_eq!(Network::Custom("my-devnet".to_string()).to_string(), "my-devnet");
        assert_eq!(Network::Custom("x".to_string()).default_rpc_url(), None);
    }

    #[test]
    fn test_deploy_args_override_config() {
        let cli = Cli::try_parse_from([
            "pairfactory",
            "deploy",
            "--network",
            "sepolia",
            "--account",
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266,0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
            "--fee-to-setter",
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
            "--pair-artifact",
            "out/Pair.json",
            "--redeploy",
        ])
        .unwrap();

        let Command::Deploy(args) = cli.command else {
            panic!("expected deploy command");
        };
        assert!(args.redeploy);

        let mut config = DeployConfig::default();
        args.network.apply(&mut config);
        args.artifacts.apply(&mut config);

        assert_eq!(config.network, "sepolia");
        assert_eq!(config.rpc_url, "https://ethereum-sepolia-rpc.publicnode.com");
        assert_eq!(config.accounts.len(), 2);
        assert_eq!(config.roles.deployer, None);
        assert_eq!(config.roles.fee_to_setter, Some(config.accounts[1]));
        assert_eq!(config.artifacts.pair, PathBuf::from("out/Pair.json"));
    }

    #[test]
    fn test_explicit_rpc_url_wins() {
        let cli = Cli::try_parse_from([
            "pairfactory",
            "deploy",
            "--network",
            "mainnet",
            "--rpc-url",
            "http://localhost:9545",
        ])
        .unwrap();

        let Command::Deploy(args) = cli.command else {
            panic!("expected deploy command");
        };

        let mut config = DeployConfig::default();
        args.network.apply(&mut config);
        assert_eq!(config.rpc_url, "http://localhost:9545");
    }

    #[test]
    fn test_set_fee_to_requires_recipient() {
        assert!(Cli::try_parse_from(["pairfactory", "set-fee-to"]).is_err());
        assert!(
            Cli::try_parse_from([
                "pairfactory",
                "set-fee-to",
                "--fee-to",
                "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
            ])
            .is_ok()
        );
    }
}
