mod support;

use remediar_client::{NotificationLevel, SessionProvider, TransportError};
use remediar_filter::{evaluate, search_text, FilterRule, LocalPager};
use serde_json::json;
use support::*;

fn stock_page() -> serde_json::Value {
    json!({
        "content": [
            { "itemEstoqueId": 3, "nomeComercial": "Novalgina", "principioAtivo": "Dipirona Sódica",
              "apresentacao": "Gotas", "quantidade": 12, "dataValidade": "2025-08-01" },
            { "itemEstoqueId": 2, "nomeComercial": "Tylenol", "principioAtivo": "Paracetamol",
              "apresentacao": "Comprimido", "quantidade": 4, "dataValidade": ["2026-01-01", "2025-03-01"] },
            { "itemEstoqueId": 1, "quantidade": 1, "dataValidade": "31/02/2025" }
        ],
        "totalPages": 1,
        "number": 0
    })
}

#[tokio::test]
async fn fetches_the_whole_stock_in_one_call() {
    let h = Harness::new();
    h.backend
        .on_get("/itens-estoque/estoqueId/5?page=0", Ok(stock_page()));

    let items = h.stock().fetch_all("5").await.unwrap();

    assert_eq!(items.len(), 2, "item with an impossible date is skipped");
    assert!(h.notifier.notifications().is_empty());
    let call = &h.backend.calls()[0];
    assert!(call
        .query
        .contains(&("size".to_string(), "10000".to_string())));
    assert!(call.query.contains(&("sort".to_string(), "id,desc".to_string())));
}

#[tokio::test]
async fn stock_items_filter_search_and_page_locally() {
    let h = Harness::new();
    h.backend
        .on_get("/itens-estoque/estoqueId/5?page=0", Ok(stock_page()));
    let items = h
        .stock()
        .fetch_all("5")
        .await
        .unwrap();

    let found = search_text(&items, "DIPIRONA SODICA");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].commercial_name, "Novalgina");

    let soon = FilterRule::from_expression("dataValidade:lt:2025-06-01").unwrap();
    let expiring = evaluate(&[soon], &items);
    assert_eq!(expiring.len(), 1);
    assert_eq!(expiring[0].commercial_name, "Tylenol");

    let mut pager = LocalPager::new(1);
    pager.go_to(1);
    assert_eq!(pager.page(&items).items[0].item_id, "2");
}

#[test]
fn stock_fetch_failure_is_reported() {
    let h = Harness::new();
    h.backend.on_get(
        "/itens-estoque/estoqueId/5?page=0",
        Err(TransportError::NoResponse),
    );

    let err = tokio_test::block_on(h.stock().fetch_all("5")).unwrap_err();
    assert_eq!(err.to_string(), "Failed to fetch data: Sem resposta do servidor");

    let notes = h.notifier.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, NotificationLevel::Error);
    assert_eq!(notes[0].title, "Erro ao carregar medicamentos do estoque");
}

#[tokio::test]
async fn stock_fetched_after_the_session_ended_is_discarded() {
    let h = Harness::new();
    h.backend
        .on_get("/itens-estoque/estoqueId/5?page=0", Ok(stock_page()));
    h.backend.expire_during_next_call(h.session.clone());

    let err = h.stock().fetch_all("5").await.unwrap_err();

    assert!(err.is_auth());
    assert!(h.session.current_token().is_none());
    assert_eq!(h.notifier.notifications()[0].title, "Usuário não autenticado");
}
