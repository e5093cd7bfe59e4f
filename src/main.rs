//! Storefront - command-line front end for the storefront client

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_client::domain::{format_date, Money, OrderSummary, Product, ResourceId};
use storefront_client::services::StatusFilter;
use storefront_client::{
    ApiClient, CartStore, CatalogClient, FileStorage, OrderClient, OrderHistory, ProductListing, ProductQuery,
    SortOption, StorefrontConfig,
};

#[derive(Parser)]
#[command(name = "storefront", version, about = "Browse the catalog, manage the cart and track orders")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List product categories
    Categories,
    /// List one page of products
    Products {
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Repeat to match any of several categories
        #[arg(long = "category")]
        categories: Vec<String>,
        #[arg(long)]
        min_price: Option<Decimal>,
        #[arg(long)]
        max_price: Option<Decimal>,
        #[arg(long, default_value_t = 0)]
        min_rating: u8,
        /// priceLowToHigh, priceHighToLow or popularity
        #[arg(long, default_value_t = SortOption::PriceLowToHigh)]
        sort: SortOption,
    },
    /// Show one product and related top-rated products
    Product { id: ResourceId },
    /// Show the cart
    Cart,
    /// Add a product to the cart
    Add {
        id: ResourceId,
        #[arg(default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of a cart line; 0 removes it
    SetQty { id: ResourceId, quantity: u32 },
    /// Remove a product from the cart
    Remove { id: ResourceId },
    /// Empty the cart
    Clear,
    /// List orders
    Orders {
        /// all, pending, processing, shipped, delivered or cancelled
        #[arg(long, default_value_t = StatusFilter::All)]
        status: StatusFilter,
    },
    /// Show one order
    Order { id: ResourceId },
    /// Cancel an order
    Cancel { id: ResourceId },
}

struct App {
    config: StorefrontConfig,
    catalog: Arc<CatalogClient>,
    cart: CartStore,
    orders: Arc<OrderClient>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = StorefrontConfig::from_env().context("loading configuration")?;
    tracing::debug!(api_url = %config.api_url, cart_dir = %config.cart_dir.display(), "Configuration loaded");

    let api = ApiClient::new(config.api_url.clone());
    let storage = FileStorage::new(&config.cart_dir).context("opening cart storage")?;
    let app = App {
        catalog: Arc::new(CatalogClient::new(api.clone())),
        cart: CartStore::load(Arc::new(storage))?,
        orders: Arc::new(OrderClient::new(api)),
        config,
    };

    match cli.command {
        Command::Categories => app.categories().await?,
        Command::Products { page, categories, min_price, max_price, min_rating, sort } => {
            let query = ProductQuery {
                page: page.max(1),
                per_page: app.config.page_size,
                categories,
                min_price: min_price.map(Money::from).unwrap_or(Money::ZERO),
                max_price: max_price.map(Money::from),
                min_rating,
                sort,
            };
            app.products(query).await?
        }
        Command::Product { id } => app.product(&id).await?,
        Command::Cart => app.print_cart(),
        Command::Add { id, quantity } => app.add(&id, quantity).await?,
        Command::SetQty { id, quantity } => {
            if !app.cart.update_quantity(&id, quantity)? {
                anyhow::bail!("product {id} is not in the cart");
            }
            app.print_cart();
        }
        Command::Remove { id } => {
            app.cart.remove_from_cart(&id)?;
            app.print_cart();
        }
        Command::Clear => {
            app.cart.clear_cart()?;
            println!("Cart cleared");
        }
        Command::Orders { status } => app.orders(status).await?,
        Command::Order { id } => app.order(&id).await?,
        Command::Cancel { id } => app.cancel(&id).await?,
    }
    Ok(())
}

impl App {
    async fn add(&self, id: &ResourceId, quantity: u32) -> storefront_client::Result<()> {
        if quantity == 0 {
            println!("Nothing to add");
            return Ok(());
        }
        let product = self.catalog.product(id).await?;
        self.cart.add_to_cart(Product::clone(&product), quantity)?;
        println!("Added {quantity} x {} to the cart", product.name);
        self.print_cart();
        Ok(())
    }

    async fn categories(&self) -> storefront_client::Result<()> {
        for category in self.catalog.categories().await?.iter() {
            let label = if category.display_name.is_empty() { &category.name } else { &category.display_name };
            println!("{:<16} {label}", category.name);
        }
        Ok(())
    }

    async fn products(&self, query: ProductQuery) -> storefront_client::Result<()> {
        let listing = ProductListing::new(Arc::clone(&self.catalog));
        listing.load(query).await?;
        let state = listing.snapshot();
        for product in &state.products {
            print_product_row(product);
        }
        println!("Page {} of {} ({} products)", state.current_page(), state.total_pages, state.total_items);
        Ok(())
    }

    async fn product(&self, id: &ResourceId) -> storefront_client::Result<()> {
        let product = self.catalog.product(id).await?;
        println!("{} [{}]", product.name, product.category);
        println!("{}", product.description);
        match product.discount_price {
            Some(discounted) => println!("Price: {discounted} (was {}, {}% off)", product.price, product.discount_percentage()),
            None => println!("Price: {}", product.price),
        }
        println!("Rating: {:.1} ({} reviews)", product.rating, product.reviews);
        if product.is_in_stock() {
            println!("In stock: {}", product.stock_count);
        } else {
            println!("Out of stock");
        }
        for key in product.spec_keys() {
            println!("  {key}: {}", product.spec_values(key).join(", "));
        }

        let listing = ProductListing::new(Arc::clone(&self.catalog));
        listing.load_related(&product).await?;
        let related = listing.snapshot().products;
        if !related.is_empty() {
            println!("\nTop rated in {}:", product.category);
            related.iter().for_each(print_product_row);
        }
        Ok(())
    }

    fn print_cart(&self) {
        let cart = self.cart.cart();
        if cart.is_empty() {
            println!("Your cart is empty");
            return;
        }
        for line in cart.lines() {
            println!("{:>4} x {:<32} {:>10}", line.quantity, line.product.name, line.line_total().to_string());
        }
        let summary = OrderSummary::from_subtotal(cart.total());
        println!("Items:    {}", cart.item_count());
        println!("Subtotal: {}", summary.subtotal);
        println!("Shipping: {}", summary.shipping);
        println!("Tax:      {}", summary.tax);
        println!("Total:    {}", summary.total);
    }

    async fn orders(&self, status: StatusFilter) -> storefront_client::Result<()> {
        let history = OrderHistory::new(Arc::clone(&self.orders));
        history.load().await?;
        history.set_status_filter(status);
        let state = history.snapshot();
        let visible = state.visible();
        if visible.is_empty() {
            println!("No orders found");
        }
        for order in visible {
            println!(
                "{:<10} {:<12} {:<20} {:>3} items {:>10}",
                order.id.as_ref().map(ResourceId::as_str).unwrap_or("-"),
                order.status.to_string(),
                format_date(&order.created_at),
                order.item_count(),
                order.total.to_string(),
            );
        }
        Ok(())
    }

    async fn order(&self, id: &ResourceId) -> storefront_client::Result<()> {
        let history = OrderHistory::new(Arc::clone(&self.orders));
        history.view_details(id).await?;
        let Some(order) = history.snapshot().selected else { return Ok(()) };
        println!("Order {id} - {}", order.status);
        println!("Placed {}", format_date(&order.created_at));
        for item in &order.items {
            println!("{:>4} x {:<32} {:>10}", item.quantity, item.product_name, item.subtotal.to_string());
        }
        println!("Subtotal: {}", order.subtotal);
        println!("Shipping: {}", order.shipping_cost);
        println!("Tax:      {}", order.tax);
        println!("Total:    {}", order.total);
        println!("Payment:  {}", order.payment_method.method_type().label());
        if let Some(tracking) = &order.tracking_number {
            println!("Tracking: {tracking}");
        }
        let ship = &order.shipping_address;
        println!("Ship to:  {}, {}, {}, {} {}", ship.full_name, ship.street_address, ship.city, ship.state, ship.zip_code);
        Ok(())
    }

    async fn cancel(&self, id: &ResourceId) -> storefront_client::Result<()> {
        let history = OrderHistory::new(Arc::clone(&self.orders));
        let order = history.cancel_order(id).await?;
        println!("Order {id} is now {}", order.status);
        Ok(())
    }
}

fn print_product_row(product: &Product) {
    let stock = if product.is_in_stock() { "" } else { " (out of stock)" };
    println!("{:<8} {:<32} {:>10} {:.1}*{stock}", product.id.as_str(), product.name, product.price.to_string(), product.rating);
}
