mod event;
mod item;
mod registry;

use proc_macro::TokenStream;

// ============================================================================
// #[derive(Item)] derive macro
// ============================================================================

/// Derive macro for the `Item` trait.
///
/// # Usage
///
/// ```ignore
/// #[derive(Item)]
/// struct DepositMoney {
///     account: String,
///     amount: u64,
/// }
/// ```
///
/// The key is derived from the type (`<module>.DepositMoney`), never from field
/// values.
///
/// Mark a `HandledFlag` field with `#[item(handled)]` to also implement
/// `Handleable`, which the `ItemBus` needs:
///
/// ```ignore
/// #[derive(Item)]
/// struct SendReceipt {
///     #[item(handled)]
///     handled: HandledFlag,
/// }
/// ```
#[proc_macro_derive(Item, attributes(item))]
pub fn derive_item(input: TokenStream) -> TokenStream {
    item::derive_item(input)
}

// ============================================================================
// #[derive(Event)] derive macro
// ============================================================================

/// Derive macro for the `Event` trait.
///
/// # Usage
///
/// ```ignore
/// #[derive(Item, Event)]
/// struct MoneyDeposited {
///     meta: EventMeta,
///     amount: u64,
/// }
/// ```
///
/// `domain()` and `id()` are read from an `EventMeta` field: the one marked
/// `#[event(meta)]`, or else the field named `meta`.
#[proc_macro_derive(Event, attributes(event))]
pub fn derive_event(input: TokenStream) -> TokenStream {
    event::derive_event(input)
}

// ============================================================================
// #[registry] attribute macro
// ============================================================================

/// Attribute macro that turns an inherent `impl` block into a provider
/// registry.
///
/// Every method of the shape
///
/// - `pub`,
/// - taking `&self` and nothing else,
/// - returning a single value that is a `Provider<..>` or a zero-argument
///   factory returning `Arc<..>` (`fn() -> Arc<H>`, `Box<dyn Fn() -> Arc<H> + ..>`,
///   `impl Fn() -> Arc<H> + ..`),
///
/// is registered under `<module>.<MethodNameInUpperCamelCase>`. Methods of any
/// other shape are left alone and skipped.
///
/// # Usage
///
/// ```ignore
/// #[registry]
/// impl AccountHandlers {
///     pub fn open_account(&self) -> Provider<dyn Handler> { ... }  // accounts.OpenAccount
///     pub fn helper(&self, x: u32) -> u32 { ... }                  // skipped
/// }
/// ```
///
/// The handler type defaults to `dyn Handler`:
///
/// - `#[registry(command)]` registers `dyn CommandHandler` providers
/// - `#[registry(handler = dyn MyHandler)]` registers any other handler type
#[proc_macro_attribute]
pub fn registry(attr: TokenStream, item: TokenStream) -> TokenStream {
    registry::expand_registry(attr, item)
}
