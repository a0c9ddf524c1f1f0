use std::process::ExitCode;
use std::sync::Arc;

use sfh_lib::dom::DomQuery;
use sfh_lib::output::SFH_OUTPUT_VERSION;
use sfh_lib::{
    AddToCartOutput, BundleOutput, CartView, Config, HarnessOutput, ProductPage, SelectOutput,
    VariantsOutput,
};
use tracing::info;

use super::{add_and_settle, select_for, with_session, Outcome};
use crate::cli::{GlobalArgs, VariantArgs};
use crate::formatting::exit_code_for_check;

/// Run the variants command.
pub async fn run_variants(global: &GlobalArgs) -> ExitCode {
    with_session(global, |dom, config| variants(dom, config)).await
}

/// Run the select command.
pub async fn run_select(global: &GlobalArgs, variant: VariantArgs, verify: bool) -> ExitCode {
    with_session(global, move |dom, config| select(dom, config, variant, verify)).await
}

/// Run the add-to-cart command.
pub async fn run_add_to_cart(global: &GlobalArgs, variant: VariantArgs) -> ExitCode {
    with_session(global, move |dom, config| add_to_cart(dom, config, variant)).await
}

/// Run the add-bundle command.
pub async fn run_add_bundle(global: &GlobalArgs) -> ExitCode {
    with_session(global, |dom, config| add_bundle(dom, config)).await
}

async fn variants<D: DomQuery + ?Sized>(dom: Arc<D>, config: Config) -> Outcome {
    let mut product = ProductPage::new(dom, &config)?;
    product.goto().await?;
    let groups = product.variants(false).await?;

    let body = HarnessOutput::Variants(VariantsOutput {
        version: SFH_OUTPUT_VERSION.to_string(),
        url: product.url().to_string(),
        groups: groups.as_ref().clone(),
    });
    Ok((body, ExitCode::SUCCESS))
}

async fn select<D: DomQuery + ?Sized>(
    dom: Arc<D>,
    config: Config,
    variant: VariantArgs,
    verify: bool,
) -> Outcome {
    let mut product = ProductPage::new(dom, &config)?;
    product.goto().await?;
    let selection = select_for(&mut product, &variant).await?;
    let selected = product.selected_options().await?;
    if verify {
        product.verify_selection(&selection).await?;
    }

    let body = HarnessOutput::Select(SelectOutput {
        version: SFH_OUTPUT_VERSION.to_string(),
        selection,
        selected,
        verified: verify,
    });
    Ok((body, ExitCode::SUCCESS))
}

async fn add_to_cart<D: DomQuery + ?Sized>(
    dom: Arc<D>,
    config: Config,
    variant: VariantArgs,
) -> Outcome {
    let mut product = ProductPage::new(Arc::clone(&dom), &config)?;
    product.goto().await?;
    let selection = select_for(&mut product, &variant).await?;
    let item = add_and_settle(dom.as_ref(), &mut product, &config).await?;

    let cart = CartView::new(dom, config.selectors.cart.clone(), config.timings.clone());
    let in_cart = cart.check_for_added_item(&item, 1).await?;
    info!(variant_id = %item.variant_id, in_cart, "checked cart for added item");

    let body = HarnessOutput::AddToCart(AddToCartOutput {
        version: SFH_OUTPUT_VERSION.to_string(),
        selection,
        item,
        in_cart,
    });
    Ok((body, exit_code_for_check(in_cart)))
}

async fn add_bundle<D: DomQuery + ?Sized>(dom: Arc<D>, config: Config) -> Outcome {
    let mut product = ProductPage::new(Arc::clone(&dom), &config)?;
    product.goto().await?;
    let selections = product.select_random_bundle_variants().await?;
    product.add_bundle_to_cart().await?;
    dom.sleep(config.timings.cart_update_settle).await;

    let cart = CartView::new(dom, config.selectors.cart.clone(), config.timings.clone());
    cart.open().await?;
    let cart_lines = cart.count().await?;

    let body = HarnessOutput::AddBundle(BundleOutput {
        version: SFH_OUTPUT_VERSION.to_string(),
        selections,
        cart_lines,
    });
    Ok((body, exit_code_for_check(cart_lines > 0)))
}
