//! Bundled demo catalog

use indic_commerce_core::Product;

fn product(id: &str, name: &str, description: &str, price: &str, category: &str, image: &str) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        price: price.to_string(),
        category: category.to_string(),
        image_url: Some(image.to_string()),
    }
}

/// Five demo products; image paths are relative to the public base URL
pub fn sample_products() -> Vec<Product> {
    vec![
        product(
            "prod1",
            "Cotton T-Shirt",
            "A comfortable 100% cotton white t-shirt",
            "₹499",
            "apparel",
            "/static/products/tshirt.jpg",
        ),
        product(
            "prod2",
            "Denim Jeans",
            "Classic blue denim jeans with straight fit",
            "₹1299",
            "apparel",
            "/static/products/jeans.jpg",
        ),
        product(
            "prod3",
            "Smartphone",
            "Latest Android smartphone with 6.5 inch display and 64MP camera",
            "₹12999",
            "electronics",
            "/static/products/phone.jpg",
        ),
        product(
            "prod4",
            "Running Shoes",
            "Comfortable running shoes with extra cushioning",
            "₹2499",
            "footwear",
            "/static/products/shoe.jpg",
        ),
        product(
            "prod5",
            "Wireless Earbuds",
            "Bluetooth wireless earbuds with noise cancellation",
            "₹1999",
            "electronics",
            "/static/products/ear_buds.jpg",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_prices_parse() {
        let products = sample_products();
        assert_eq!(products.len(), 5);
        assert!(products.iter().all(|p| p.price_rupees().is_some()));
    }
}
