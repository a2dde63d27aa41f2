#![allow(dead_code)]

use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use remediar_client::{
    Backend, ClientConfig, MemoryNotifier, RequestRepository, SessionProvider, StockRepository,
    TokenSession, TransportError, TransportResult,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const STAFF_ID: &str = "7";
pub const STAFF_NAME: &str = "Ana Paula";

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub token: String,
}

/// In-memory backend. GET routes are keyed by path, plus `?page=N` when
/// the call carries a page parameter; PATCH routes by path. Unrouted GETs
/// answer 404, unrouted PATCHes succeed with an empty body.
#[derive(Default)]
pub struct FakeBackend {
    gets: Mutex<HashMap<String, TransportResult<Value>>>,
    patches: Mutex<HashMap<String, TransportResult<Value>>>,
    calls: Mutex<Vec<Call>>,
    expire_during_call: Mutex<Option<Arc<dyn SessionProvider>>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on_get(&self, key: &str, reply: TransportResult<Value>) {
        self.gets.lock().unwrap().insert(key.to_string(), reply);
    }

    pub fn on_patch(&self, path: &str, reply: TransportResult<Value>) {
        self.patches.lock().unwrap().insert(path.to_string(), reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn patches(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == "PATCH")
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// End `session` while the next call is in flight, before it answers.
    pub fn expire_during_next_call(&self, session: Arc<dyn SessionProvider>) {
        *self.expire_during_call.lock().unwrap() = Some(session);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
        let session = self.expire_during_call.lock().unwrap().take();
        if let Some(session) = session {
            session.expire();
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: &str,
    ) -> TransportResult<Value> {
        self.record(Call {
            method: "GET",
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            body: None,
            token: token.to_string(),
        });

        let key = match query.iter().find(|(k, _)| *k == "page") {
            Some((_, page)) => format!("{path}?page={page}"),
            None => path.to_string(),
        };
        self.gets
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Err(not_found()))
    }

    async fn patch_json(&self, path: &str, body: &Value, token: &str) -> TransportResult<Value> {
        self.record(Call {
            method: "PATCH",
            path: path.to_string(),
            query: Vec::new(),
            body: Some(body.clone()),
            token: token.to_string(),
        });

        self.patches
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or(Ok(Value::Null))
    }
}

pub fn not_found() -> TransportError {
    TransportError::Status {
        status: 404,
        message: "Not Found".to_string(),
    }
}

pub fn unauthorized() -> TransportError {
    TransportError::from_body(401, &json!({ "message": "Token expirado" }))
}

pub fn staff_token(exp_offset_secs: i64) -> String {
    let claims = json!({
        "id": STAFF_ID.parse::<i64>().unwrap(),
        "sub": "ana@remediar.org",
        "nome": STAFF_NAME,
        "role": "FUNCIONARIO",
        "exp": chrono::Utc::now().timestamp() + exp_offset_secs,
    });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test")).unwrap()
}

pub fn staff_session() -> Arc<dyn SessionProvider> {
    TokenSession::new(staff_token(3600)).shared()
}

/// One request in the list layout.
pub fn raw_request(id: &str, requester_id: u32, name: &str, status: &str) -> Value {
    json!({
        "solicitacao": {
            "id": id,
            "usuario": {
                "id": requester_id,
                "nome": name,
                "email": format!("snapshot{requester_id}@mail.com")
            },
            "dataHoraCriacao": "10/03/2024 09:30",
            "statusAtual": status,
            "historico": [{
                "id": format!("h{id}"),
                "dataHora": "10/03/2024 09:30",
                "status": "PENDENTE",
                "observacao": "Solicitação criada"
            }]
        },
        "item": { "nomeComercialOrPrincipioAtivo": "Dipirona 500mg", "quantidade": 2 },
        "modoEntrega": "RETIRADA"
    })
}

pub fn page(content: Vec<Value>, total_pages: u32, number: u32) -> Value {
    json!({ "content": content, "totalPages": total_pages, "number": number })
}

pub fn profile(email: &str) -> Value {
    json!({
        "usuario": {
            "user": { "login": email },
            "endereco": {
                "rua": "Rua das Flores",
                "numero": 120,
                "cidade": "Recife",
                "estado": "PE",
                "cep": "50000-000"
            }
        }
    })
}

pub struct Harness {
    pub backend: Arc<FakeBackend>,
    pub session: Arc<dyn SessionProvider>,
    pub notifier: Arc<MemoryNotifier>,
    pub repository: RequestRepository,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_session(staff_session())
    }

    pub fn with_session(session: Arc<dyn SessionProvider>) -> Self {
        let backend = FakeBackend::new();
        let notifier = Arc::new(MemoryNotifier::new());
        let repository = RequestRepository::new(
            backend.clone(),
            session.clone(),
            ClientConfig::default(),
            notifier.clone(),
        );
        Self {
            backend,
            session,
            notifier,
            repository,
        }
    }

    /// Stock repository over the same backend, session and notifier.
    pub fn stock(&self) -> StockRepository {
        StockRepository::new(
            self.backend.clone(),
            self.session.clone(),
            self.notifier.clone(),
        )
    }

    /// Route page 0 of the unscoped listing and load it.
    pub async fn load(&mut self, content: Vec<Value>) {
        self.backend
            .on_get("/solicitacoes/pedidos?page=0", Ok(page(content, 1, 0)));
        self.repository.fetch_page(0).await.expect("page loads");
    }
}
