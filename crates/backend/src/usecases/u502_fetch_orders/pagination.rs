use crate::shared::marketplaces::amazon::models::{Order, OrderItem, OrdersQuery};
use crate::shared::marketplaces::amazon::{OrdersApi, SpApiError};

/// Все заказы по запросу, с переходом по `NextToken` до последней страницы
pub async fn fetch_all_orders(
    api: &dyn OrdersApi,
    query: &OrdersQuery,
) -> Result<Vec<Order>, SpApiError> {
    let mut orders = Vec::new();
    let mut next_token: Option<String> = None;
    let mut page_no = 0;

    loop {
        let page = api.get_orders(query, next_token.as_deref()).await?;
        page_no += 1;
        tracing::debug!(
            "Orders page {}: {} orders, next token: {}",
            page_no,
            page.orders.len(),
            page.next_token.is_some()
        );
        orders.extend(page.orders);
        match page.next_token.filter(|t| !t.is_empty()) {
            Some(token) => next_token = Some(token),
            None => break,
        }
    }

    Ok(orders)
}

/// Все позиции заказа
pub async fn fetch_all_order_items(
    api: &dyn OrdersApi,
    amazon_order_id: &str,
) -> Result<Vec<OrderItem>, SpApiError> {
    let mut items = Vec::new();
    let mut next_token: Option<String> = None;

    loop {
        let page = api
            .get_order_items(amazon_order_id, next_token.as_deref())
            .await?;
        items.extend(page.order_items);
        match page.next_token.filter(|t| !t.is_empty()) {
            Some(token) => next_token = Some(token),
            None => break,
        }
    }

    Ok(items)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::shared::marketplaces::amazon::models::{
        Money, OrderItemsPage, OrdersPage,
    };
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    pub fn order(id: &str) -> Order {
        Order {
            amazon_order_id: id.to_string(),
            purchase_date: "2024-04-02T10:11:12Z".into(),
            order_status: "Shipped".into(),
            fulfillment_channel: Some("AFN".into()),
            marketplace_id: Some("A21TJRUUN4KGV".into()),
            order_total: None,
            shipping_address: None,
            buyer_info: None,
        }
    }

    pub fn order_item(asin: &str, sku: &str, qty: i64, price: &str, tax: &str) -> OrderItem {
        OrderItem {
            asin: asin.to_string(),
            seller_sku: Some(sku.to_string()),
            order_item_id: format!("{}-{}", asin, sku),
            title: Some(format!("{} title", sku)),
            quantity_ordered: qty,
            quantity_shipped: Some(qty),
            item_price: Some(Money {
                currency_code: "INR".into(),
                amount: price.to_string(),
            }),
            item_tax: Some(Money {
                currency_code: "INR".into(),
                amount: tax.to_string(),
            }),
        }
    }

    /// Orders API с заранее заданными страницами
    #[derive(Default)]
    pub struct FakeOrdersApi {
        pub pages: Mutex<Vec<OrdersPage>>,
        pub items: HashMap<String, Vec<OrderItem>>,
        pub calls: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl OrdersApi for FakeOrdersApi {
        async fn get_orders(
            &self,
            _query: &OrdersQuery,
            next_token: Option<&str>,
        ) -> Result<OrdersPage, SpApiError> {
            self.calls
                .lock()
                .unwrap()
                .push(next_token.map(str::to_string));
            let mut pages = self.pages.lock().unwrap();
            if pages.is_empty() {
                return Ok(OrdersPage::default());
            }
            Ok(pages.remove(0))
        }

        async fn get_order_items(
            &self,
            amazon_order_id: &str,
            _next_token: Option<&str>,
        ) -> Result<OrderItemsPage, SpApiError> {
            Ok(OrderItemsPage {
                amazon_order_id: Some(amazon_order_id.to_string()),
                order_items: self.items.get(amazon_order_id).cloned().unwrap_or_default(),
                next_token: None,
            })
        }
    }

    #[tokio::test]
    async fn test_follows_next_token_once() {
        let api = FakeOrdersApi {
            pages: Mutex::new(vec![
                OrdersPage {
                    orders: vec![order("408-1"), order("408-2")],
                    next_token: Some("abc".into()),
                },
                OrdersPage {
                    orders: vec![order("408-3")],
                    next_token: None,
                },
            ]),
            ..Default::default()
        };
        let query = OrdersQuery::shipped_fba("A21TJRUUN4KGV", "2024-04-01T00:00:00.000Z".into());

        let orders = fetch_all_orders(&api, &query).await.unwrap();
        let ids: Vec<_> = orders.iter().map(|o| o.amazon_order_id.as_str()).collect();
        assert_eq!(ids, vec!["408-1", "408-2", "408-3"]);
        assert_eq!(
            *api.calls.lock().unwrap(),
            vec![None, Some("abc".to_string())]
        );
    }

    #[tokio::test]
    async fn test_empty_first_page() {
        let api = FakeOrdersApi::default();
        let query = OrdersQuery::shipped_fba("A21TJRUUN4KGV", "2024-04-01T00:00:00.000Z".into());
        assert!(fetch_all_orders(&api, &query).await.unwrap().is_empty());
        assert_eq!(api.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_page_with_token_is_followed() {
        let api = FakeOrdersApi {
            pages: Mutex::new(vec![
                OrdersPage {
                    orders: vec![],
                    next_token: Some("abc".into()),
                },
                OrdersPage {
                    orders: vec![order("408-9")],
                    next_token: None,
                },
            ]),
            ..Default::default()
        };
        let query = OrdersQuery::shipped_fba("A21TJRUUN4KGV", "2024-04-01T00:00:00.000Z".into());

        let orders = fetch_all_orders(&api, &query).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].amazon_order_id, "408-9");
        assert_eq!(
            *api.calls.lock().unwrap(),
            vec![None, Some("abc".to_string())]
        );
    }
}
