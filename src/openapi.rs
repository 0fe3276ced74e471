use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Chika POS API",
        description = "Kasir, inventori, pelanggan, dan katalog digital untuk UMKM"
    ),
    components(schemas(
        crate::db::models::Product,
        crate::db::models::Customer,
        crate::db::models::RedemptionOption,
        crate::handlers::stores::RegisterPayload,
        crate::handlers::products::ProductPayload,
        crate::handlers::customers::CustomerPayload,
        crate::handlers::checkout::CheckoutPayload,
        crate::handlers::checkout::CartLinePayload,
        crate::handlers::loyalty::RedemptionOptionPayload,
        crate::handlers::loyalty::RedeemPayload,
        crate::handlers::topups::TopUpPayload,
        crate::handlers::catalog::CatalogProfile,
        crate::handlers::catalog::CatalogProduct,
        crate::handlers::catalog::OrderPayload,
        crate::handlers::catalog::OrderItemPayload,
    )),
    tags(
        (name = "chika-pos", description = "POS dan katalog digital")
    )
)]
pub struct ApiDoc;
