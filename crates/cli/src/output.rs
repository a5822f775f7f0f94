//! Plain-text rendering for command output.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use heirloom_core::CurrencyCode;
use heirloom_storefront::api::{Category, Order, Pagination, PaypalPaymentStatus, Product, User};
use heirloom_storefront::cart::CartView;
use heirloom_storefront::checkout::OrderReview;

pub fn line(text: &str) {
    println!("{text}");
}

pub fn failure(message: &str) {
    eprintln!("error: {message}");
}

pub fn products(products: &[&Product], pagination: Option<&Pagination>, currency: CurrencyCode) {
    if products.is_empty() {
        println!("No products found.");
        return;
    }
    for product in products {
        let tribe = product.tribe.as_ref().map_or("", |t| t.name.as_str());
        let stock = if product.in_stock() {
            format!("{} in stock", product.inventory)
        } else {
            "out of stock".to_string()
        };
        println!(
            "{:<26} {:<32} {:>12}  {:<14} {}",
            product.id,
            product.name,
            product.price.display(currency),
            tribe,
            stock
        );
    }
    if let Some(p) = pagination {
        println!("Page {} of {} ({} products)", p.page, p.total_pages, p.total);
    }
}

pub fn product(product: &Product, currency: CurrencyCode) {
    println!("{}", product.name);
    println!("  id:       {}", product.id);
    println!("  price:    {}", product.price.display(currency));
    println!("  stock:    {}", product.inventory);
    if let Some(tribe) = &product.tribe {
        println!("  tribe:    {} ({})", tribe.name, tribe.region);
    }
    if let Some(category) = &product.category {
        println!("  category: {}", category.name);
    }
    if let Some(image) = product.primary_image() {
        println!("  image:    {image}");
    }
    if !product.description.is_empty() {
        println!();
        println!("{}", product.description);
    }
}

pub fn categories(categories: &[Category]) {
    if categories.is_empty() {
        println!("No categories found.");
        return;
    }
    for category in categories {
        let count = category
            .product_count
            .map_or_else(String::new, |n| format!("{n} products"));
        println!(
            "{:<26} {:<28} {:<24} {:<9} {}",
            category.id,
            category.name,
            category.slug,
            if category.featured { "featured" } else { "" },
            count
        );
    }
}

pub fn category(category: &Category) {
    println!("{}", category.name);
    println!("  id:       {}", category.id);
    if !category.slug.is_empty() {
        println!("  slug:     {}", category.slug);
    }
    println!("  featured: {}", if category.featured { "yes" } else { "no" });
    if let Some(count) = category.product_count {
        println!("  products: {count}");
    }
    if let Some(image) = &category.image_url {
        println!("  image:    {image}");
    }
    if let Some(description) = category.description.as_deref().filter(|d| !d.is_empty()) {
        println!();
        println!("{description}");
    }
}

pub fn cart(view: &CartView) {
    if let Some(error) = &view.error {
        eprintln!("warning: {error}");
    }
    if view.items.is_empty() {
        println!("Your cart is empty.");
    }
    for item in &view.items {
        println!(
            "{:<26} {:<32} {:>3} x {:>10} = {:>10}",
            item.id, item.name, item.quantity, item.price, item.line_price
        );
    }
    println!();
    println!("Items:    {}", view.item_count);
    println!("Subtotal: {}", view.subtotal);
    println!("Tax:      {}", view.tax);
    println!("Shipping: {}", view.shipping);
    println!("Total:    {}", view.total);
    println!();
    println!("[{}]", view.primary_action.label());
}

pub fn review(review: &OrderReview) {
    println!("Shipping to:");
    for address_line in review.shipping.lines() {
        println!("  {address_line}");
    }
    println!("Payment: {}", review.payment_summary());
    println!();
    let pricing = &review.pricing;
    for item in review.lines() {
        println!(
            "  {} x {} @ {} = {}",
            item.quantity,
            item.name,
            pricing.format(item.unit_price),
            pricing.format(item.line_total)
        );
    }
    println!("Subtotal: {}", pricing.format(pricing.subtotal));
    println!("Tax:      {}", pricing.format(pricing.tax));
    if pricing.free_shipping() {
        println!("Shipping: Free");
    } else {
        println!("Shipping: {}", pricing.format(pricing.shipping));
    }
    println!("Total:    {}", pricing.format(pricing.total));
}

pub fn orders(orders: &[Order], currency: CurrencyCode) {
    if orders.is_empty() {
        println!("No orders yet.");
        return;
    }
    for order in orders {
        let placed = order
            .created_at
            .map_or_else(String::new, |at| at.format("%Y-%m-%d").to_string());
        println!(
            "{:<26} {:<12} {:>12}  {:<10} {}",
            order.id,
            order.status,
            order.total_price.display(currency),
            if order.is_paid { "paid" } else { "unpaid" },
            placed
        );
    }
}

pub fn order(order: &Order, currency: CurrencyCode) {
    println!("Order {}", order.id);
    println!("  status:   {}", order.status);
    if let Some(method) = order.payment_method {
        println!("  payment:  {method}");
    }
    for item in &order.order_items {
        println!(
            "  {} x {} @ {}",
            item.quantity,
            item.name,
            item.price.display(currency)
        );
    }
    println!("  tax:      {}", order.tax_price.display(currency));
    println!("  shipping: {}", order.shipping_price.display(currency));
    println!("  total:    {}", order.total_price.display(currency));
}

pub fn paypal_status(status: &PaypalPaymentStatus) {
    println!("PayPal payment: {}", if status.paid() { "paid" } else { "not paid" });
    if let Some(state) = &status.status {
        println!("  status:  {state}");
    }
    if let Some(order) = &status.order {
        println!("  order:   {} ({})", order.id, order.status);
    }
    if let Some(message) = &status.message {
        println!("  message: {message}");
    }
}

pub fn user(user: &User) {
    println!("{} <{}>", user.display_name(), user.email);
    println!("  id:   {}", user.id);
    println!("  role: {}", user.role);
}
