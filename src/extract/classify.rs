//! Simple-product classification
//!
//! A page is "simple" when none of the variant, grouped, bundle or
//! configurable indicators below are present. Each check is independent and
//! any single match disqualifies the page.

use crate::html::compile_selectors;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static WIX_OPTIONS: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile_selectors(&[
        "[data-hook='product-options'] select, [data-hook='product-options'] [role='listbox']",
    ])
});

/// Markup whose mere presence means variations, groups or bundles
static DISQUALIFYING_MARKUP: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile_selectors(&[
        // WooCommerce variations
        "form.variations_form, .variations, table.variations, .single_variation_wrap",
        // WooCommerce grouped
        ".grouped_form, table.group_table, .woocommerce-grouped-product-list",
        // WooCommerce bundles
        ".bundle_form, .bundled_products, .woocommerce-product-bundle",
        // Magento configurable
        ".swatch-attribute, .configurable-options, #product-options-wrapper select",
    ])
});

static SHOPIFY_VARIANTS: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile_selectors(&[
        "select[name='id'], .product-form__variants select, variant-selects select, variant-radios input",
    ])
});

static GENERIC_OPTION_SELECTS: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile_selectors(&[
        "select[name*='size'], select[name*='color'], select[name*='variant']",
    ])
});

static OPTION: Lazy<Vec<Selector>> = Lazy::new(|| compile_selectors(&["option"]));
static ROLE_OPTION: Lazy<Vec<Selector>> = Lazy::new(|| compile_selectors(&["[role='option']"]));
static RADIO_INPUTS: Lazy<Vec<Selector>> =
    Lazy::new(|| compile_selectors(&["input[type='radio']"]));
static BODY: Lazy<Vec<Selector>> = Lazy::new(|| compile_selectors(&["body"]));

/// Body classes set by platforms on non-simple product pages
pub const NON_SIMPLE_BODY_CLASSES: &[&str] = &[
    "product-type-variable",
    "product-type-grouped",
    "product-type-bundle",
    "product-type-configurable",
];

fn select_all<'a>(
    document: &'a Html,
    selectors: &'a [Selector],
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    selectors
        .iter()
        .flat_map(move |selector| document.select(selector))
}

fn count_within(element: &ElementRef, selectors: &[Selector]) -> usize {
    selectors
        .iter()
        .map(|selector| element.select(selector).count())
        .sum()
}

fn has_multiple_options(element: &ElementRef) -> bool {
    let options = count_within(element, &OPTION);
    let options = if options == 0 {
        count_within(element, &ROLE_OPTION)
    } else {
        options
    };
    options > 1
}

fn radio_group_size(document: &Html, name: &str) -> usize {
    select_all(document, &RADIO_INPUTS)
        .filter(|input| input.value().attr("name") == Some(name))
        .count()
}

fn has_shopify_variants(document: &Html) -> bool {
    select_all(document, &SHOPIFY_VARIANTS).any(|element| {
        match element.value().name() {
            "select" => count_within(&element, &OPTION) > 1,
            "input" if element.value().attr("type") == Some("radio") => element
                .value()
                .attr("name")
                .is_some_and(|name| radio_group_size(document, name) > 1),
            _ => false,
        }
    })
}

fn has_non_simple_body_class(document: &Html) -> bool {
    select_all(document, &BODY).next().is_some_and(|body| {
        body.value()
            .classes()
            .any(|class| NON_SIMPLE_BODY_CLASSES.contains(&class))
    })
}

/// Returns true if the page offers exactly one purchasable SKU
pub fn is_simple_product(document: &Html) -> bool {
    if select_all(document, &WIX_OPTIONS).any(|options| has_multiple_options(&options)) {
        return false;
    }

    if select_all(document, &DISQUALIFYING_MARKUP).next().is_some() {
        return false;
    }

    if has_shopify_variants(document) {
        return false;
    }

    if select_all(document, &GENERIC_OPTION_SELECTS).any(|select| count_within(&select, &OPTION) > 1)
    {
        return false;
    }

    !has_non_simple_body_class(document)
}
