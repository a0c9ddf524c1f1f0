use clap::{Args, Parser, Subcommand, ValueEnum};
use sfh_lib::Viewport;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sfh")]
#[command(
    version,
    about = "Storefront Harness - drive a storefront's product page and cart from the command line",
    long_about = "Storefront Harness (SFH)\n\nModes:\n- variants: list the variant groups a product page renders.\n- select: select an explicit or random variant option.\n- add-to-cart: select a variant, add it, and confirm it landed in the cart.\n- add-bundle: pick random options for every bundle item and add the bundle.\n- cart: add a variant, then change its quantity, remove it, or proceed to checkout.\n\nUse --help on any subcommand for details."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    #[arg(long, global = true, help = "Enable verbose (debug) logging on stderr")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Optional config file (TOML) for base URL, timings, selectors and browser options; CLI flags override config"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value = "json", help = "Output format")]
    pub format: OutputFormat,

    #[arg(long, short, global = true, help = "Output file path (stdout if omitted)")]
    pub output: Option<PathBuf>,

    #[arg(long, global = true, value_name = "URL", help = "Storefront base URL")]
    pub base_url: Option<String>,

    #[arg(long, global = true, value_name = "PATH", help = "Product page path, e.g. /products/cloud-zip-hoodie")]
    pub product_path: Option<String>,

    #[arg(long, global = true, help = "Show the browser window")]
    pub headed: bool,

    #[arg(
        long,
        global = true,
        help = "Viewport dimensions (WIDTHxHEIGHT, desktop or mobile)"
    )]
    pub viewport: Option<Viewport>,
}

/// An explicit variant option; both halves or neither.
#[derive(Args, Debug, Clone, Default)]
pub struct VariantArgs {
    #[arg(long, requires = "option", help = "Variant group type, e.g. color or size")]
    pub group: Option<String>,

    #[arg(long, requires = "group", help = "Input id of the option within the group")]
    pub option: Option<String>,
}

impl VariantArgs {
    pub fn explicit(&self) -> Option<(&str, &str)> {
        match (&self.group, &self.option) {
            (Some(group), Some(option)) => Some((group.as_str(), option.as_str())),
            _ => None,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the variant groups rendered on the product page
    Variants,

    /// Select a variant option (random available one if none given)
    Select {
        #[command(flatten)]
        variant: VariantArgs,

        #[arg(long, help = "Reload and confirm the selection persisted")]
        verify: bool,
    },

    /// Select a variant, add it to the cart and confirm the cart line
    AddToCart {
        #[command(flatten)]
        variant: VariantArgs,
    },

    /// Pick random options for each bundle item and add the bundle
    AddBundle,

    /// Add a variant, then adjust, remove or check out its cart line
    Cart {
        #[command(flatten)]
        variant: VariantArgs,

        #[arg(long, value_name = "N", help = "Target quantity for the cart line")]
        quantity: Option<u32>,

        #[arg(long, conflicts_with = "checkout", help = "Remove the line after adding it")]
        remove: bool,

        #[arg(long, help = "Proceed to checkout and report whether it loaded")]
        checkout: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Pretty,
}

pub fn parse() -> Cli {
    Cli::parse()
}
