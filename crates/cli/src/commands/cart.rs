//! Shopping cart commands.

use clap::Subcommand;
use shopcart_client::{Basket, BasketManager};
use shopcart_core::ProductId;

use super::CommandError;

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the current cart
    Show,
    /// Add a product to the cart
    Add {
        /// Product id
        id: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Change the quantity of a line item
    Update {
        /// Product id
        id: String,

        /// New quantity
        #[arg(short, long)]
        quantity: u32,
    },
    /// Remove a line item
    Remove {
        /// Product id
        id: String,
    },
    /// Empty the cart
    Clear,
}

pub async fn dispatch(basket: &BasketManager, action: CartAction) -> Result<(), CommandError> {
    match action {
        CartAction::Show => {
            basket.fetch().await?;
        }
        CartAction::Add { id, quantity } => {
            basket.add_item(&ProductId::new(id), quantity).await?;
            println!("Added to cart");
        }
        CartAction::Update { id, quantity } => {
            basket.update_item(&ProductId::new(id), quantity).await?;
            println!("Cart updated");
        }
        CartAction::Remove { id } => {
            basket.remove_item(&ProductId::new(id)).await?;
            println!("Removed from cart");
        }
        CartAction::Clear => {
            basket.clear().await?;
            println!("Cart cleared");
        }
    }

    print_basket(&basket.snapshot());
    Ok(())
}

fn print_basket(basket: &Basket) {
    if basket.items.is_empty() {
        println!("Cart is empty");
        return;
    }

    println!();
    for item in &basket.items {
        println!(
            "{:<26} {:>3} x {:>10} = {:>10}",
            item.product.name,
            item.quantity,
            item.price.to_string(),
            item.line_total().to_string()
        );
    }
    println!("{:>56}", format!("Total: {}", basket.total_amount));
}
