/// Conventional listing-page paths, probed in order against the base URL
pub const CATEGORY_PATHS: &[&str] = &[
    "/shop/",
    "/store/",
    "/products/",
    "/collections/all/",
    "/category/",
    "/product-category/",
    "/catalog/",
    "/all-products/",
    "/shop-all/",
    "/items/",
    "/Shop By Categories/",
    "/browse/",
    "/search/",
    "/all/",
    "/all-categories/",
    "/Shop by Category/",
    "/Collections/",
];
