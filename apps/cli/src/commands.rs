//! Command implementations

use crate::config::AppConfig;
use anyhow::Context;
use remediar_client::{
    Action, AdminOverride, DetailView, HttpBackend, LifecycleMachine, MemoryNotifier,
    NotificationLevel, RequestRepository, SessionProvider, StatusScope, StockRepository,
    TokenSession,
};
use remediar_filter::{
    evaluate, search_text, DateRange, FilterRule, LocalPager, PageState, SolicitationField,
    StockField, DEFAULT_PAGE_BUTTONS,
};
use remediar_models::date::{format_date, format_datetime};
use remediar_models::{parse_calendar_date, yes_no, RequesterProfile, Solicitation, Status};
use std::sync::Arc;

pub struct App {
    repository: RequestRepository,
    stock: StockRepository,
    notifier: Arc<MemoryNotifier>,
}

impl App {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let backend = Arc::new(HttpBackend::new(&config.client)?);
        let session = match &config.session.token {
            Some(token) => TokenSession::new(token.clone()),
            None => TokenSession::anonymous(),
        };
        session.on_expire(Box::new(|| {
            eprintln!("Sessão expirada. Faça login novamente.");
        }));
        let session: Arc<dyn SessionProvider> = Arc::new(session);
        let notifier = Arc::new(MemoryNotifier::new());

        Ok(Self {
            repository: RequestRepository::new(
                backend.clone(),
                session.clone(),
                config.client.clone(),
                notifier.clone(),
            ),
            stock: StockRepository::new(backend, session, notifier.clone()),
            notifier,
        })
    }

    pub async fn list(
        mut self,
        page: u32,
        status: &str,
        filters: &[String],
        from: Option<&str>,
        to: Option<&str>,
    ) -> anyhow::Result<()> {
        let scope: StatusScope = status.parse()?;
        let rules = filters
            .iter()
            .map(|f| FilterRule::<SolicitationField>::from_expression(f))
            .collect::<Result<Vec<_>, _>>()?;
        let day = |raw: Option<&str>| {
            raw.map(|value| {
                parse_calendar_date(value).with_context(|| format!("Data inválida: {value}"))
            })
            .transpose()
        };
        let range = DateRange::new(day(from)?, day(to)?);

        let loaded = self.repository.fetch_by_status(scope, page).await;
        self.print_notifications();
        loaded?;
        self.repository.resolve_current_emails().await;

        let rows = range.apply(&evaluate(&rules, self.repository.items()));
        if rows.is_empty() {
            println!("Nenhuma solicitação encontrada.");
        }
        for s in &rows {
            println!(
                "{:<8} {:<28} {:<30} {:<24} {:>4}  {}  {}",
                s.id,
                s.requester.name,
                self.repository.display_email(s),
                s.item.medication,
                s.item.quantity,
                format_datetime(&s.item.requested_at),
                s.status.label()
            );
        }
        print_pages(self.repository.page());
        Ok(())
    }

    pub async fn show(mut self, id: &str, page: u32) -> anyhow::Result<()> {
        let solicitation = self.load_one(id, page).await?;
        let profile = match self.repository.requester_profile(&solicitation.requester.id).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(requester_id = %solicitation.requester.id, error = %e, "Profile lookup failed");
                RequesterProfile::placeholder()
            }
        };

        print_details(&solicitation, &self.repository.display_email(&solicitation), &profile);
        Ok(())
    }

    pub async fn act(mut self, id: &str, action: &str, page: u32) -> anyhow::Result<()> {
        let action: Action = action.parse().map_err(anyhow::Error::msg)?;
        self.load_one(id, page).await?;

        let machine = LifecycleMachine::new(self.notifier.clone());
        let mut view = DetailView::new();
        view.open(id);
        let outcome = machine
            .perform(&mut self.repository, &mut view, id, action)
            .await;

        self.print_notifications();
        outcome?;
        Ok(())
    }

    pub async fn override_status(mut self, id: &str, status: &str, page: u32) -> anyhow::Result<()> {
        let status: Status = status.parse()?;
        self.load_one(id, page).await?;

        let mut view = DetailView::new();
        view.open(id);
        let outcome = AdminOverride::new(self.notifier.clone())
            .set_status(&mut self.repository, &mut view, id, status)
            .await;

        self.print_notifications();
        outcome?;
        Ok(())
    }

    pub async fn stock(
        self,
        stock_id: &str,
        filters: &[String],
        search: Option<&str>,
        page: u32,
    ) -> anyhow::Result<()> {
        let rules = filters
            .iter()
            .map(|f| FilterRule::<StockField>::from_expression(f))
            .collect::<Result<Vec<_>, _>>()?;

        let fetched = self.stock.fetch_all(stock_id).await;
        self.print_notifications();
        let items = fetched?;
        let items = evaluate(&rules, &search_text(&items, search.unwrap_or_default()));

        let mut pager = LocalPager::default();
        pager.go_to(page);
        let current = pager.page(&items);
        if current.items.is_empty() {
            println!("Nenhum medicamento encontrado.");
        }
        for item in current.items {
            let expiry = item
                .next_expiry()
                .map(|d| format_date(&d))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{:<8} {:<28} {:<28} {:<16} {:>6}  {}",
                item.item_id,
                item.commercial_name,
                item.active_ingredient,
                item.presentation,
                item.quantity,
                expiry
            );
        }
        println!("{} itens", current.total_items);
        print_pages(current.state);
        Ok(())
    }

    async fn load_one(&mut self, id: &str, page: u32) -> anyhow::Result<Solicitation> {
        let loaded = self.repository.fetch_page(page).await;
        self.print_notifications();
        loaded?;
        self.repository.resolve_current_emails().await;
        self.repository
            .get(id)
            .cloned()
            .with_context(|| format!("Solicitação {id} não está na página {page}"))
    }

    fn print_notifications(&self) {
        for n in self.notifier.drain() {
            let marker = match n.level {
                NotificationLevel::Success => "✓",
                NotificationLevel::Error => "✗",
            };
            match n.description {
                Some(description) => println!("{marker} {} - {description}", n.title),
                None => println!("{marker} {}", n.title),
            }
        }
    }
}

fn print_pages(state: PageState) {
    if state.total_pages == 0 {
        return;
    }
    let buttons: Vec<String> = state
        .window(DEFAULT_PAGE_BUTTONS)
        .map(|p| {
            if p == state.current {
                format!("[{}]", p + 1)
            } else {
                (p + 1).to_string()
            }
        })
        .collect();
    println!(
        "Página {} de {}   {}",
        state.current + 1,
        state.total_pages,
        buttons.join(" ")
    );
}

fn print_details(s: &Solicitation, email: &str, profile: &RequesterProfile) {
    println!("Solicitação #{}  ({})", s.id, s.status.label());
    println!(
        "Responsável: {}",
        s.assigned_staff.as_deref().unwrap_or("-")
    );
    println!();
    println!("Solicitante: {}", s.requester.name);
    println!("  Documento: {}", s.requester.document.as_deref().unwrap_or("-"));
    println!("  Telefone:  {}", s.requester.phone.as_deref().unwrap_or("-"));
    println!("  E-mail:    {email}");
    println!("  Endereço:  {}", profile.address);
    println!();
    println!("Medicamento: {} x{}", s.item.medication, s.item.quantity);
    println!("  Entrega:   {}", s.item.delivery_mode.label());
    println!("  Data:      {}", format_datetime(&s.item.requested_at));

    if let Some(p) = &s.prescription {
        println!();
        println!("Prescrição");
        println!(
            "  Emissão:   {}",
            p.issued_on.as_ref().map(format_date).unwrap_or_else(|| "-".into())
        );
        println!("  Paciente:  {}", p.patient_name.as_deref().unwrap_or("-"));
        println!("  Idade:     {}", p.patient_age.as_deref().unwrap_or("-"));
        println!("  CPF:       {}", p.patient_document.as_deref().unwrap_or("-"));
        println!("  Médico:    {}", p.physician_name.as_deref().unwrap_or("-"));
        println!("  CRM:       {}", p.physician_license.as_deref().unwrap_or("-"));
        println!("  Dispensada: {}", yes_no(p.dispensed));
        println!("  Uso contínuo: {}", yes_no(p.continuous_use));
    }

    if !s.history.is_empty() {
        println!();
        println!("Histórico");
        for entry in &s.history {
            println!(
                "  {}  {:<20} {:<16} {}",
                format_datetime(&entry.at),
                entry.status.label(),
                entry.staff.as_deref().unwrap_or("-"),
                entry.note
            );
        }
    }

    let actions = Action::available_for(s.status);
    if !actions.is_empty() {
        println!();
        let labels: Vec<String> = actions
            .iter()
            .map(|a| format!("{} ({})", a.label(), a.as_str()))
            .collect();
        println!("Ações: {}", labels.join(", "));
    }
}
