use super::*;

mod category_and_quantity_controls;
mod product_search_page;
