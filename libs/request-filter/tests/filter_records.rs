use remediar_filter::{
    evaluate, search_text, DateRange, FilterRule, LocalPager, Operator, RuleSet,
    SolicitationField, StockField,
};
use remediar_models::{normalize, normalize_stock_item, Solicitation, Status, StockItem};
use serde_json::json;

fn solicitation(id: &str, name: &str, medication: &str, quantity: u32, created: &str) -> Solicitation {
    normalize(json!({
        "solicitacao": {
            "id": id,
            "usuario": { "id": 1, "nome": name },
            "dataHoraCriacao": created,
            "statusAtual": "PENDENTE",
            "historico": []
        },
        "item": { "nomeComercialOrPrincipioAtivo": medication, "quantidade": quantity },
        "modoEntrega": "RETIRADA"
    }))
    .expect("valid solicitation")
}

fn requests() -> Vec<Solicitation> {
    vec![
        solicitation("1", "João Silva", "Dipirona", 2, "01/03/2024 09:00"),
        solicitation("2", "Maria Souza", "Losartana", 30, "15/03/2024 10:00"),
        solicitation("3", "Joana Lima", "Amoxicilina", 12, "02/04/2024 08:15"),
    ]
}

fn stock_item(id: u32, name: &str, ingredient: &str, quantity: i64, expiry: &str) -> StockItem {
    normalize_stock_item(json!({
        "itemEstoqueId": id,
        "nomeComercial": name,
        "principioAtivo": ingredient,
        "apresentacao": "Comprimido",
        "quantidade": quantity,
        "dataValidade": [expiry]
    }))
    .expect("valid stock item")
}

fn ids(records: &[Solicitation]) -> Vec<&str> {
    records.iter().map(|s| s.id.as_str()).collect()
}

#[test]
fn empty_rule_set_keeps_every_request() {
    let mut rules = RuleSet::<SolicitationField>::new();
    rules.add();
    assert_eq!(evaluate(rules.rules(), &requests()), requests());
}

#[test]
fn equals_on_name_ignores_accents_and_case() {
    let rule = FilterRule::new(SolicitationField::RequesterName, Operator::Equals, "JOAO SILVA")
        .unwrap();
    let found = evaluate(&[rule], &requests());
    assert_eq!(ids(&found), vec!["1"]);
}

#[test]
fn filtered_output_is_a_subset_in_input_order() {
    let rules = vec![
        FilterRule::from_expression("quantidade:gte:10").unwrap(),
        FilterRule::from_expression("dataSolicitacao:lt:2024-04-30").unwrap(),
    ];
    let found = evaluate(&rules, &requests());
    assert_eq!(ids(&found), vec!["2", "3"]);
}

#[test]
fn status_matches_its_label() {
    let rule = FilterRule::from_expression("status:equals:pendente").unwrap();
    assert_eq!(evaluate(&[rule], &requests()).len(), 3);
}

#[test]
fn status_matches_wire_name_or_label() {
    let mut records = requests();
    records[1].status = Status::EmAnalise;

    for value in ["EM_ANALISE", "em análise", "Em Analise"] {
        let rule = FilterRule::new(SolicitationField::Status, Operator::Equals, value).unwrap();
        assert_eq!(ids(&evaluate(&[rule], &records)), vec!["2"], "value {value}");
    }

    let rule = FilterRule::from_expression("status:contains:analise").unwrap();
    assert_eq!(ids(&evaluate(&[rule], &records)), vec!["2"]);
    let rule = FilterRule::from_expression("status:startsWith:EM_").unwrap();
    assert_eq!(ids(&evaluate(&[rule], &records)), vec!["2"]);
}

#[test]
fn date_range_narrows_by_request_day() {
    let range = DateRange::new(
        remediar_models::parse_calendar_date("2024-03-15"),
        remediar_models::parse_calendar_date("2024-04-02"),
    );
    assert_eq!(ids(&range.apply(&requests())), vec!["2", "3"]);
}

#[test]
fn stock_search_filter_and_page() {
    let stock: Vec<StockItem> = (1..=23)
        .map(|n| {
            let (name, ingredient) = if n % 2 == 0 {
                ("Paracetamol", "Paracetamol")
            } else {
                ("Novalgina", "Dipirona Sódica")
            };
            stock_item(n, name, ingredient, i64::from(n), "2025-12-31")
        })
        .collect();

    let searched = search_text(&stock, "dipirona sodica");
    assert_eq!(searched.len(), 12);

    let rule = FilterRule::new(StockField::Quantity, Operator::Gt, "10").unwrap();
    let filtered = evaluate(&[rule], &searched);
    assert!(filtered.iter().all(|item| item.quantity > 10));
    assert_eq!(filtered.len(), 7);

    let mut pager = LocalPager::default();
    pager.go_to(1);
    let page = pager.page(&searched);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.state.total_pages, 2);
    assert!(page.state.has_previous());

    // Narrowing the list past the current page sends the pager home.
    let page = pager.page(&filtered);
    assert_eq!(page.state.current, 0);
    assert_eq!(page.items.len(), 7);
}

#[test]
fn expiry_filter_uses_earliest_date() {
    let item = normalize_stock_item(json!({
        "itemEstoqueId": "9",
        "nomeComercial": "Insulina",
        "quantidade": 4,
        "dataValidade": ["2026-01-10", "2025-06-01"]
    }))
    .unwrap();
    let rule = FilterRule::new(StockField::ExpiryDate, Operator::Lte, "30/06/2025").unwrap();
    assert_eq!(evaluate(&[rule], &[item]).len(), 1);
}
