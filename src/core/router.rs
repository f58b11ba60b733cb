//! Chatbot intent routing
//!
//! Free text is checked against a fixed, ordered list of keyword rules. The first rule that
//! matches answers straight from the catalog. Text no rule matches goes to the
//! [`TextGenerator`]. Nothing is kept between calls.

use crate::core::assistant::{AssistantError, render_prompt};
use crate::core::catalog::{Catalog, KNOWN_CATEGORIES, Product, format_rupiah};
use crate::core::traits::TextGenerator;
use log::{error, warn};

/// How many products the cheapest and recommendation lists show.
const LIST_LIMIT: usize = 3;

pub const NO_DATA_REPLY: &str = "Maaf, data produk saat ini tidak tersedia.";
pub const AI_UNAVAILABLE_REPLY: &str =
    "Maaf, layanan AI sedang tidak tersedia. Silakan gunakan quick replies atau hubungi admin.";
pub const AI_EMPTY_REPLY: &str =
    "Maaf, saya tidak bisa memberikan jawaban saat ini. Silakan coba lagi.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Cheapest,
    Discounted,
    OutOfStock,
    /// Keyword left after stripping the search trigger, possibly empty.
    Search(String),
    /// `None` when no known category was named.
    Category(Option<&'static str>),
    Recommendation,
}

impl Intent {
    /// Matches normalized text against the rules in priority order.
    pub fn detect(text: &str) -> Option<Intent> {
        if text.contains("murah") || text.contains("termurah") {
            return Some(Intent::Cheapest);
        }

        if text.contains("diskon") || text.contains("promo") {
            return Some(Intent::Discounted);
        }

        if text.contains("stok habis") || text.contains("kosong") {
            return Some(Intent::OutOfStock);
        }

        if text.starts_with("cari") || text.contains("search") {
            return Some(Intent::Search(search_keyword(text)));
        }

        if text.contains("kategori") {
            let category = KNOWN_CATEGORIES
                .into_iter()
                .find(|category| text.contains(category));
            return Some(Intent::Category(category));
        }

        if text.contains("rekomendasi") || text.contains("sarankan") {
            return Some(Intent::Recommendation);
        }

        None
    }

    /// Builds the reply for this intent from catalog data.
    pub fn answer(&self, catalog: &Catalog) -> String {
        if catalog.is_empty() {
            return NO_DATA_REPLY.to_owned();
        }

        match self {
            Intent::Cheapest => {
                let mut sorted: Vec<&Product> = catalog.all().iter().collect();
                sorted.sort_by_key(|p| p.price);
                sorted.truncate(LIST_LIMIT);

                format!(
                    "🏷️ **{} Produk Termurah:**\n\n{}",
                    sorted.len(),
                    ranked_list(&sorted)
                )
            }
            Intent::Discounted => {
                let discounted = catalog.discounted();
                if discounted.is_empty() {
                    return "Maaf, saat ini tidak ada produk diskon.".to_owned();
                }

                let items: Vec<String> = discounted
                    .iter()
                    .map(|p| {
                        format!(
                            "• **{}**\n  💵 Rp {}\n  ~~Rp {}~~ ({})\n  📦 Stok: {}",
                            p.name,
                            format_rupiah(p.price),
                            format_rupiah(p.old_price.unwrap_or(p.price)),
                            p.badge.as_ref().map_or("Diskon", |b| b.label.as_str()),
                            p.stock
                        )
                    })
                    .collect();

                format!("🎯 **Produk dengan diskon:**\n\n{}", items.join("\n\n"))
            }
            Intent::OutOfStock => {
                let out = catalog.out_of_stock();
                if out.is_empty() {
                    return "✅ Semua produk masih tersedia stoknya.".to_owned();
                }

                let items: Vec<String> = out.iter().map(|p| format!("• {}", p.name)).collect();
                format!("❌ **Produk stok habis:**\n\n{}", items.join("\n"))
            }
            Intent::Search(keyword) => {
                if keyword.is_empty() {
                    return "Kata kunci apa yang ingin Anda cari?".to_owned();
                }

                let found = catalog.search(keyword);
                if found.is_empty() {
                    return format!("❌ Tidak ditemukan produk dengan kata kunci '{keyword}'.");
                }

                format!(
                    "🔍 **Hasil pencarian '{keyword}':**\n\n{}",
                    bullet_list(&found)
                )
            }
            Intent::Category(Some(category)) => {
                let products = catalog.by_category(category);
                if products.is_empty() {
                    return format!("Tidak ada produk dalam kategori {category}.");
                }

                format!(
                    "📁 **Produk kategori {category}:**\n\n{}",
                    bullet_list(&products)
                )
            }
            Intent::Category(None) => format!(
                "Kategori yang tersedia: {}. Coba tanya 'produk kategori besi'",
                KNOWN_CATEGORIES.join(", ")
            ),
            Intent::Recommendation => {
                let available: Vec<&Product> = catalog
                    .all()
                    .iter()
                    .filter(|p| !p.is_out_of_stock())
                    .take(LIST_LIMIT)
                    .collect();
                if available.is_empty() {
                    return "Maaf, saat ini semua produk sedang habis.".to_owned();
                }

                format!(
                    "⭐ **Rekomendasi produk untuk Anda:**\n\n{}",
                    ranked_list(&available)
                )
            }
        }
    }
}

/// Outcome of the rule table for one message.
#[derive(Debug, PartialEq, Eq)]
pub enum Route {
    Reply(String),
    Delegate,
}

pub fn normalize(text: &str) -> String {
    text.to_lowercase().trim().to_owned()
}

/// Applies the keyword rules only, without calling out.
pub fn resolve(text: &str, catalog: &Catalog) -> Route {
    match Intent::detect(&normalize(text)) {
        Some(intent) => Route::Reply(intent.answer(catalog)),
        None => Route::Delegate,
    }
}

/// Answers a chat message. Never fails: generator errors turn into an apology.
pub async fn route(text: &str, catalog: &Catalog, generator: &dyn TextGenerator) -> String {
    match resolve(text, catalog) {
        Route::Reply(reply) => reply,
        Route::Delegate => delegate(text, catalog, generator).await,
    }
}

async fn delegate(text: &str, catalog: &Catalog, generator: &dyn TextGenerator) -> String {
    let result = match render_prompt(text, catalog) {
        Ok(prompt) => generator.generate(&prompt).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(reply) if !reply.trim().is_empty() => reply,
        Ok(_) | Err(AssistantError::EmptyResponse) => {
            warn!("assistant returned an empty answer");
            AI_EMPTY_REPLY.to_owned()
        }
        Err(e) => {
            error!("assistant unavailable: {e}");
            AI_UNAVAILABLE_REPLY.to_owned()
        }
    }
}

/// Removes the first search trigger: a leading "cari", otherwise the first "search".
fn search_keyword(text: &str) -> String {
    let stripped = match text.strip_prefix("cari") {
        Some(rest) => rest.to_owned(),
        None => text.replacen("search", "", 1),
    };
    stripped.trim().to_owned()
}

fn ranked_list(products: &[&Product]) -> String {
    products
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let mut item = format!(
                "{}. **{}**\n   💵 Rp {}\n   📦 Stok: {}",
                i + 1,
                p.name,
                format_rupiah(p.price),
                p.stock
            );
            if let Some(old_price) = p.old_price {
                item.push_str(&format!("\n   💰 ~~Rp {}~~", format_rupiah(old_price)));
            }
            if let Some(category) = &p.category {
                item.push_str(&format!("\n   📁 {category}"));
            }
            item
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn bullet_list(products: &[&Product]) -> String {
    products
        .iter()
        .map(|p| {
            let mut item = format!(
                "• **{}**\n  💵 Rp {}\n  📦 Stok: {}",
                p.name,
                format_rupiah(p.price),
                p.stock
            );
            if let Some(old_price) = p.old_price {
                item.push_str(&format!("\n  💰 ~~Rp {}~~", format_rupiah(old_price)));
            }
            item
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
