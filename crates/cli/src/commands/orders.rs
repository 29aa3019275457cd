//! Checkout and order history commands.

use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use shopcart_client::api::{NewOrder, Order, ShippingAddress};
use shopcart_client::{BasketManager, SessionManager, StoreApi};
use shopcart_core::{OrderId, PaymentMethod};

use super::{CommandError, require_credential};

/// Arguments for `shopcart checkout`.
#[derive(Args)]
pub struct CheckoutArgs {
    /// Recipient name
    #[arg(long)]
    pub name: String,

    /// Street address
    #[arg(long)]
    pub street: String,

    /// City
    #[arg(long)]
    pub city: String,

    /// State or province
    #[arg(long)]
    pub state: String,

    /// ZIP or postal code
    #[arg(long)]
    pub zip: String,

    /// Country
    #[arg(long)]
    pub country: String,

    /// Payment method: credit_card, paypal, or cash_on_delivery
    #[arg(long, default_value = "credit_card")]
    pub payment_method: PaymentMethod,
}

#[derive(Subcommand)]
pub enum OrdersAction {
    /// List past orders
    List,
    /// Show one order in detail
    Show {
        /// Order id
        id: String,
    },
}

pub async fn checkout(
    api: &impl StoreApi,
    session: &SessionManager,
    basket: &BasketManager,
    args: CheckoutArgs,
) -> Result<(), CommandError> {
    let shipping_address = ShippingAddress {
        name: args.name,
        street: args.street,
        city: args.city,
        state: args.state,
        zip_code: args.zip,
        country: args.country,
    };
    if let Err(field) = shipping_address.validate() {
        return Err(CommandError::InvalidInput(format!(
            "shipping address is missing a {field}"
        )));
    }

    let credential = require_credential(session)?;

    basket.fetch().await?;
    let contents = basket.snapshot();
    if contents.items.is_empty() {
        return Err(CommandError::InvalidInput(
            "cart is empty - nothing to order".to_string(),
        ));
    }

    // Estimated tax is a display convenience; the server-computed total on
    // the order is what the customer is charged.
    let subtotal = contents.total_amount;
    let tax = subtotal * Decimal::new(1, 1);
    println!("Subtotal:      {subtotal}");
    println!("Estimated tax: {tax}");

    let new_order = NewOrder {
        shipping_address,
        payment_method: args.payment_method,
    };
    let order = api.place_order(&credential, &new_order).await?;
    basket.clear().await?;

    println!("\nOrder placed: {}", order.order_number);
    print_order(&order);
    Ok(())
}

pub async fn dispatch(
    api: &impl StoreApi,
    session: &SessionManager,
    action: OrdersAction,
) -> Result<(), CommandError> {
    let credential = require_credential(session)?;
    match action {
        OrdersAction::List => {
            let orders = api.my_orders(&credential).await?;
            if orders.is_empty() {
                println!("No orders yet");
                return Ok(());
            }
            for order in &orders {
                println!(
                    "{:<12} {}  {:>10}  {:?}",
                    order.order_number,
                    order.created_at.format("%Y-%m-%d"),
                    order.total_amount.to_string(),
                    order.status
                );
            }
        }
        OrdersAction::Show { id } => {
            let order = api.order(&credential, &OrderId::new(id)).await?;
            println!("{}", order.order_number);
            print_order(&order);
        }
    }
    Ok(())
}

fn print_order(order: &Order) {
    for item in &order.items {
        println!(
            "  {:<26} {:>3} x {:>10} = {:>10}",
            item.name,
            item.quantity,
            item.price.to_string(),
            item.price.times(item.quantity).to_string()
        );
    }
    println!("  Total:    {}", order.total_amount);
    println!("  Status:   {:?} / payment {:?}", order.status, order.payment_status);
    println!("  Payment:  {}", order.payment_method.label());
    let a = &order.shipping_address;
    println!(
        "  Ship to:  {}, {}, {}, {} {}, {}",
        a.name, a.street, a.city, a.state, a.zip_code, a.country
    );
    println!("  Placed:   {}", order.created_at.format("%Y-%m-%d %H:%M UTC"));
}
