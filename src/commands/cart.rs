use std::process::ExitCode;
use std::sync::Arc;

use sfh_lib::dom::DomQuery;
use sfh_lib::output::SFH_OUTPUT_VERSION;
use sfh_lib::types::QuantityChange;
use sfh_lib::{CartOutput, CartView, CheckoutPage, CheckoutReport, Config, HarnessOutput, ProductPage};

use super::{add_and_settle, select_for, with_session, Outcome};
use crate::cli::{GlobalArgs, VariantArgs};
use crate::formatting::exit_code_for_check;

/// What to do with the cart line once the item is added.
#[derive(Debug, Clone, Default)]
pub struct CartActions {
    pub quantity: Option<u32>,
    pub remove: bool,
    pub checkout: bool,
}

/// Run the cart command.
pub async fn run_cart(global: &GlobalArgs, variant: VariantArgs, actions: CartActions) -> ExitCode {
    with_session(global, move |dom, config| cart_flow(dom, config, variant, actions)).await
}

async fn cart_flow<D: DomQuery + ?Sized>(
    dom: Arc<D>,
    config: Config,
    variant: VariantArgs,
    actions: CartActions,
) -> Outcome {
    let mut product = ProductPage::new(Arc::clone(&dom), &config)?;
    product.goto().await?;
    select_for(&mut product, &variant).await?;
    let item = add_and_settle(dom.as_ref(), &mut product, &config).await?;

    let cart = CartView::new(
        Arc::clone(&dom),
        config.selectors.cart.clone(),
        config.timings.clone(),
    );
    if let Some(quantity) = actions.quantity {
        cart.change_item_quantity(&QuantityChange {
            variant_id: item.variant_id.clone(),
            quantity,
        })
        .await?;
    }

    let mut line = None;
    let mut lines = Vec::new();
    if actions.remove {
        cart.remove_item(&item.variant_id).await?;
        dom.sleep(config.timings.cart_update_settle).await;
        lines = cart.all_items().await?;
    } else {
        line = Some(cart.get_cart_item_details(&item.variant_id).await?);
    }

    let mut checkout = None;
    if actions.checkout {
        let navigation = cart.proceed_to_checkout().await?;
        let page = CheckoutPage::new(Arc::clone(&dom));
        checkout = Some(CheckoutReport {
            navigation,
            loaded: page.is_loaded().await?,
            url: dom.current_url().await?,
        });
    }

    let passed = checkout.as_ref().map_or(true, |c| c.loaded);
    let body = HarnessOutput::Cart(CartOutput {
        version: SFH_OUTPUT_VERSION.to_string(),
        item,
        quantity: actions.quantity,
        line,
        lines,
        removed: actions.remove,
        checkout,
    });
    Ok((body, exit_code_for_check(passed)))
}
