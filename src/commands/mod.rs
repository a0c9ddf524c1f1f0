mod cart;
mod product;

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;

use sfh_lib::dom::DomQuery;
use sfh_lib::types::{AddToCartResult, VariantSelection};
use sfh_lib::{Config, HarnessOutput, PlaywrightSession, ProductPage, Result, SessionOptions};
use tracing::warn;

use crate::cli::{GlobalArgs, VariantArgs};
use crate::formatting::{render_error, write_output};
use crate::settings::resolve_config;

pub use cart::{run_cart, CartActions};
pub use product::{run_add_bundle, run_add_to_cart, run_select, run_variants};

/// A finished command: its report and the exit code for it.
pub(crate) type Outcome = Result<(HarnessOutput, ExitCode)>;

/// Resolve config, run `flow` against a fresh browser session, close the
/// session and write the outcome.
pub(crate) async fn with_session<F, Fut>(global: &GlobalArgs, flow: F) -> ExitCode
where
    F: FnOnce(Arc<PlaywrightSession>, Config) -> Fut,
    Fut: Future<Output = Outcome>,
{
    let outcome = match resolve_config(global) {
        Ok(config) => match PlaywrightSession::launch(SessionOptions::from(&config)).await {
            Ok(session) => {
                let session = Arc::new(session);
                let outcome = flow(Arc::clone(&session), config).await;
                if let Err(err) = session.close().await {
                    warn!(error = %err, "failed to close browser session");
                }
                outcome
            }
            Err(err) => Err(err),
        },
        Err(err) => Err(err),
    };
    emit(outcome, global)
}

/// Write the outcome, mapping errors to the exit-2 error payload.
pub(crate) fn emit(outcome: Outcome, global: &GlobalArgs) -> ExitCode {
    match outcome {
        Ok((body, code)) => match write_output(&body, global.format, global.output.clone()) {
            Ok(()) => code,
            Err(err) => render_error(
                sfh_lib::HarnessError::Config(err.to_string()),
                global.format,
                global.output.clone(),
            ),
        },
        Err(err) => render_error(err, global.format, global.output.clone()),
    }
}

/// Explicit selection when both flags were given, otherwise a random viable one.
pub(crate) async fn select_for<D: DomQuery + ?Sized>(
    product: &mut ProductPage<D>,
    variant: &VariantArgs,
) -> Result<VariantSelection> {
    match variant.explicit() {
        Some((group, option)) => product.select_explicit(group, option).await,
        None => product.select_random_variant().await,
    }
}

/// Add the current selection and give the cart time to pick it up.
pub(crate) async fn add_and_settle<D: DomQuery + ?Sized>(
    dom: &D,
    product: &mut ProductPage<D>,
    config: &Config,
) -> Result<AddToCartResult> {
    let item = product.add_to_cart().await?;
    dom.sleep(config.timings.cart_update_settle).await;
    Ok(item)
}
