//! Implements the `Transport` trait with an in-memory BudgetPlanner server.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a network connection (see `Mode::Test`).

use crate::api::{ApiRequest, Method, RawResponse, Transport};
use crate::model::Amount;
use crate::Result;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

const TOKEN_PREFIX: &str = "test-access-";
const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";

/// An in-memory server that answers requests the way the BudgetPlanner REST API does. Clones share
/// state, so a test can keep a handle to inspect recorded requests after giving the server to an
/// `ApiClient`.
///
/// Access tokens have the form `test-access-<username>` so that a token survives a restart of the
/// process, which matters when the CLI runs in test mode.
#[derive(Clone)]
pub struct TestServer {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    users: Vec<UserRow>,
    categories: Vec<CategoryRow>,
    outcomes: Vec<OutcomeRow>,
    next_id: i64,
    requests: Vec<ApiRequest>,
    scripted: VecDeque<RawResponse>,
}

struct UserRow {
    id: i64,
    username: String,
    password: String,
    email: String,
    phone_number: String,
    first_name: String,
    last_name: String,
    balance: Decimal,
}

struct CategoryRow {
    id: i64,
    name: String,
    user_id: i64,
    created_at: DateTime<Utc>,
}

struct OutcomeRow {
    id: i64,
    amount: Decimal,
    user_id: i64,
    category_id: i64,
    created_at: DateTime<Utc>,
}

impl TestServer {
    /// The seeded user's credentials.
    pub const DEMO_USERNAME: &'static str = "demo";
    pub const DEMO_PASSWORD: &'static str = "demo-password";

    /// A server with no users and no data.
    pub fn empty() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                next_id: 1,
                ..State::default()
            })),
        }
    }

    /// Registers a user directly and returns the access token the server would issue for them.
    pub fn add_user(&self, username: &str, password: &str) -> String {
        let mut state = self.lock_state();
        let id = state.id();
        state.users.push(UserRow {
            id,
            username: username.to_string(),
            password: password.to_string(),
            email: format!("{username}@example.com"),
            phone_number: "+15550100".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            balance: Decimal::ZERO,
        });
        token_for(username)
    }

    /// The access token the server issues to `username`.
    pub fn access_token(username: &str) -> String {
        token_for(username)
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.lock_state().requests.clone()
    }

    pub fn last_request(&self) -> Option<ApiRequest> {
        self.lock_state().requests.last().cloned()
    }

    /// Queues a response that is returned, unchanged, for the next request instead of routing it.
    pub fn respond_next(&self, response: RawResponse) {
        self.lock_state().scripted.push_back(response);
    }

    /// The current balance of `username`, read directly from the store.
    pub fn balance_of(&self, username: &str) -> Option<Decimal> {
        self.lock_state()
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.balance)
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for TestServer {
    /// Seeds the server with a demo user, three categories and a handful of outcomes.
    fn default() -> Self {
        let server = Self::empty();
        server.add_user(Self::DEMO_USERNAME, Self::DEMO_PASSWORD);
        {
            let mut state = server.lock_state();
            let user_id = state.users[0].id;
            state.users[0].balance = dec("1000.00");
            let seed_day = |d: u32| Utc.with_ymd_and_hms(2025, 10, d, 12, 0, 0).single();
            let mut category_ids = Vec::new();
            for name in ["Groceries", "Restaurants", "Utilities"] {
                let id = state.id();
                category_ids.push(id);
                state.categories.push(CategoryRow {
                    id,
                    name: name.to_string(),
                    user_id,
                    created_at: seed_day(1).unwrap_or_else(Utc::now),
                });
            }
            let seed = [
                (0, "87.43", 20),
                (1, "14.85", 17),
                (0, "63.21", 15),
                (2, "142.67", 16),
            ];
            for (category_ix, amount, day) in seed {
                let id = state.id();
                state.outcomes.push(OutcomeRow {
                    id,
                    amount: dec(amount),
                    user_id,
                    category_id: category_ids[category_ix],
                    created_at: seed_day(day).unwrap_or_else(Utc::now),
                });
            }
        }
        server
    }
}

#[async_trait::async_trait]
impl Transport for TestServer {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse> {
        let mut state = self.lock_state();
        state.requests.push(request.clone());
        if let Some(scripted) = state.scripted.pop_front() {
            return Ok(scripted);
        }
        Ok(state.route(request))
    }
}

fn token_for(username: &str) -> String {
    format!("{TOKEN_PREFIX}{username}")
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap_or_default()
}

fn money(value: Decimal) -> Value {
    Value::String(value.round_dp(2).to_string())
}

fn not_found() -> RawResponse {
    RawResponse::json(404, &json!({"detail": "Not found."}))
}

fn field_error(field: &str, message: &str) -> RawResponse {
    RawResponse::json(400, &json!({ field: [message] }))
}

/// Splits `edit-category/3/` into `("edit-category", Some(3))`. A non-numeric id is treated as an
/// unknown route.
fn split_path(path: &str) -> Option<(&str, Option<i64>)> {
    let mut parts = path.trim_matches('/').split('/');
    let route = parts.next()?;
    let id = match parts.next() {
        Some(raw) => Some(raw.parse().ok()?),
        None => None,
    };
    if parts.next().is_some() {
        return None;
    }
    Some((route, id))
}

impl State {
    fn id(&mut self) -> i64 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        id
    }

    fn route(&mut self, request: &ApiRequest) -> RawResponse {
        let Some((route, id)) = split_path(&request.path) else {
            return not_found();
        };
        let body = match request.body.as_deref().map(serde_json::from_str::<Value>) {
            None => Value::Object(Map::new()),
            Some(Ok(value)) => value,
            Some(Err(_)) => return RawResponse::json(400, &json!({"detail": "JSON parse error"})),
        };

        match (request.method, route, id) {
            (Method::Post, "sign-in", None) => return self.sign_in(&body),
            (Method::Post, "sign-up", None) => return self.sign_up(&body),
            _ => {}
        }

        let Some(user_id) = self.authenticate(request) else {
            return RawResponse::json(
                401,
                &json!({"detail": "Authentication credentials were not provided."}),
            );
        };

        match (request.method, route, id) {
            (Method::Get, "get-balance", None) => self.get_balance(user_id),
            (Method::Post, "edit-balance", None) => self.edit_balance(user_id, &body),
            (Method::Get, "list-categories", None) => self.list_categories(user_id, request),
            (Method::Post, "create-category", None) => self.create_category(user_id, &body),
            (Method::Get, "get-category", Some(id)) => self.get_category(user_id, id),
            (Method::Patch, "edit-category", Some(id)) => self.edit_category(user_id, id, &body),
            (Method::Delete, "delete-category", Some(id)) => self.delete_category(user_id, id),
            (Method::Get, "list-outcomes", None) => self.list_outcomes(user_id, request),
            (Method::Get, "list-outcomes-with-statistics", None) => self.statistics(user_id),
            (Method::Get, "get-outcome", Some(id)) => self.get_outcome(user_id, id),
            (Method::Post, "add-outcome", None) => self.add_outcome(user_id, &body),
            (Method::Patch, "edit-outcome", Some(id)) => self.edit_outcome(user_id, id, &body),
            (Method::Delete, "delete-outcome", Some(id)) => self.delete_outcome(user_id, id),
            (Method::Get, "get-user-data", None) => self.user_data(user_id),
            (Method::Patch, "update_profile", None) => self.update_profile(user_id, &body),
            _ => not_found(),
        }
    }

    fn authenticate(&self, request: &ApiRequest) -> Option<i64> {
        let token = request.header("Authorization")?.strip_prefix("Bearer ")?;
        let username = token.strip_prefix(TOKEN_PREFIX)?;
        self.users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.id)
    }

    fn user_mut(&mut self, user_id: i64) -> Option<&mut UserRow> {
        self.users.iter_mut().find(|u| u.id == user_id)
    }

    fn sign_in(&self, body: &Value) -> RawResponse {
        let username = body.get("username").and_then(Value::as_str).unwrap_or("");
        let password = body.get("password").and_then(Value::as_str).unwrap_or("");
        if username.is_empty() {
            return field_error("username", REQUIRED);
        }
        if password.is_empty() {
            return field_error("password", REQUIRED);
        }
        let known = self
            .users
            .iter()
            .any(|u| u.username == username && u.password == password);
        if !known {
            return RawResponse::json(
                401,
                &json!({"detail": "Invalid credentials, please try again"}),
            );
        }
        RawResponse::json(
            200,
            &json!({
                "username": username,
                "tokens": {
                    "refresh": uuid::Uuid::new_v4().to_string(),
                    "access": token_for(username),
                }
            }),
        )
    }

    fn sign_up(&mut self, body: &Value) -> RawResponse {
        let field = |name: &str| {
            body.get(name)
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string()
        };
        let (username, phone, email, password) = (
            field("username"),
            field("phone_number").replace(' ', ""),
            field("email"),
            field("password"),
        );

        let mut errors = Map::new();
        let required = [
            ("username", &username),
            ("phone_number", &phone),
            ("password", &password),
        ];
        for (name, value) in required {
            if value.is_empty() {
                errors.insert(name.to_string(), json!([REQUIRED]));
            }
        }
        if self.users.iter().any(|u| u.username == username) {
            errors.insert(
                "username".to_string(),
                json!(["This username is already registered."]),
            );
        }
        if !email.is_empty() && self.users.iter().any(|u| u.email == email) {
            errors.insert(
                "email".to_string(),
                json!(["This email is already registered."]),
            );
        }
        if !phone.is_empty() {
            let digits = phone.strip_prefix('+');
            match digits {
                None => {
                    errors.insert(
                        "phone_number".to_string(),
                        json!(["Phone number must start with `+`."]),
                    );
                }
                Some(d) if d.is_empty() || !d.chars().all(|c| c.is_ascii_digit()) => {
                    errors.insert(
                        "phone_number".to_string(),
                        json!(["Phone number must consist of digits only."]),
                    );
                }
                Some(_) => {}
            }
        }
        if !errors.is_empty() {
            return RawResponse::json(400, &Value::Object(errors));
        }

        let id = self.id();
        self.users.push(UserRow {
            id,
            username: username.clone(),
            password,
            email: email.clone(),
            phone_number: phone.clone(),
            first_name: String::new(),
            last_name: String::new(),
            balance: Decimal::ZERO,
        });
        RawResponse::json(
            201,
            &json!({"id": id, "email": email, "phone_number": phone, "username": username}),
        )
    }

    fn get_balance(&mut self, user_id: i64) -> RawResponse {
        match self.user_mut(user_id) {
            Some(user) => RawResponse::json(200, &json!({"balance": money(user.balance)})),
            None => not_found(),
        }
    }

    fn edit_balance(&mut self, user_id: i64, body: &Value) -> RawResponse {
        let amount = match parse_amount(body.get("amount")) {
            Ok(amount) => amount,
            Err(response) => return response,
        };
        if amount.is_negative() {
            return field_error(
                "amount",
                "Ensure this value is greater than or equal to 0.",
            );
        }
        match self.user_mut(user_id) {
            Some(user) => {
                user.balance = amount.value();
                RawResponse::json(200, &json!({"message": "Balance updated successfully"}))
            }
            None => not_found(),
        }
    }

    fn category_json(category: &CategoryRow) -> Value {
        json!({"id": category.id, "name": category.name, "user": category.user_id})
    }

    fn list_categories(&self, user_id: i64, request: &ApiRequest) -> RawResponse {
        let created_at = query_param(request, "created_at");
        let categories: Vec<Value> = self
            .categories
            .iter()
            .filter(|c| c.user_id == user_id)
            .filter(|c| match created_at {
                Some(s) => c.created_at.to_rfc3339().contains(s),
                None => true,
            })
            .map(Self::category_json)
            .collect();
        RawResponse::json(200, &Value::Array(categories))
    }

    fn create_category(&mut self, user_id: i64, body: &Value) -> RawResponse {
        let name = match required_name(body) {
            Ok(name) => name,
            Err(response) => return response,
        };
        let id = self.id();
        let category = CategoryRow {
            id,
            name,
            user_id,
            created_at: Utc::now(),
        };
        let response = RawResponse::json(201, &Self::category_json(&category));
        self.categories.push(category);
        response
    }

    fn get_category(&self, user_id: i64, id: i64) -> RawResponse {
        match self
            .categories
            .iter()
            .find(|c| c.id == id && c.user_id == user_id)
        {
            Some(category) => RawResponse::json(200, &Self::category_json(category)),
            None => not_found(),
        }
    }

    fn edit_category(&mut self, user_id: i64, id: i64, body: &Value) -> RawResponse {
        let name = if body.get("name").is_some() {
            match required_name(body) {
                Ok(name) => Some(name),
                Err(response) => return response,
            }
        } else {
            None
        };
        match self
            .categories
            .iter_mut()
            .find(|c| c.id == id && c.user_id == user_id)
        {
            Some(category) => {
                if let Some(name) = name {
                    category.name = name;
                }
                RawResponse::json(200, &Self::category_json(category))
            }
            None => not_found(),
        }
    }

    /// Deleting a category also deletes its outcomes.
    fn delete_category(&mut self, user_id: i64, id: i64) -> RawResponse {
        let before = self.categories.len();
        self.categories
            .retain(|c| !(c.id == id && c.user_id == user_id));
        if self.categories.len() == before {
            return not_found();
        }
        self.outcomes.retain(|o| o.category_id != id);
        RawResponse::json(200, &json!({"message": "Category deleted successfully"}))
    }

    fn outcome_json(outcome: &OutcomeRow) -> Value {
        json!({
            "id": outcome.id,
            "amount": money(outcome.amount),
            "user": outcome.user_id,
            "category": outcome.category_id,
            "created_at": outcome.created_at.to_rfc3339(),
        })
    }

    fn list_outcomes(&self, user_id: i64, request: &ApiRequest) -> RawResponse {
        // Empty parameters are ignored, as the server does.
        let param = |name: &str| query_param(request, name).filter(|v| !v.is_empty());
        let number = |name: &str| param(name).map(|v| v.parse::<Decimal>());

        let category_id = param("category_id").map(|v| v.parse::<i64>());
        let (min, max) = (number("min_price"), number("max_price"));
        if matches!(min, Some(Err(_))) || matches!(max, Some(Err(_))) {
            return RawResponse::json(400, &json!({"detail": "A valid number is required."}));
        }
        if matches!(category_id, Some(Err(_))) {
            return RawResponse::json(400, &json!({"detail": "A valid integer is required."}));
        }
        let created_at = param("created_at");

        let outcomes: Vec<Value> = self
            .outcomes
            .iter()
            .filter(|o| o.user_id == user_id)
            .filter(|o| !matches!(category_id, Some(Ok(c)) if o.category_id != c))
            .filter(|o| !matches!(min, Some(Ok(m)) if o.amount < m))
            .filter(|o| !matches!(max, Some(Ok(m)) if o.amount > m))
            .filter(|o| created_at.map_or(true, |s| o.created_at.to_rfc3339().contains(s)))
            .map(Self::outcome_json)
            .collect();
        RawResponse::json(200, &Value::Array(outcomes))
    }

    fn statistics(&self, user_id: i64) -> RawResponse {
        let mine = || self.outcomes.iter().filter(move |o| o.user_id == user_id);
        let overall: Decimal = mine().map(|o| o.amount).sum();
        let mut totals: HashMap<i64, Decimal> = HashMap::new();
        for outcome in mine() {
            *totals.entry(outcome.category_id).or_default() += outcome.amount;
        }

        let stats: Vec<Value> = self
            .categories
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| {
                let total = totals.get(&c.id).copied();
                let percentage = match total {
                    Some(t) if !overall.is_zero() => t / overall * Decimal::ONE_HUNDRED,
                    _ => Decimal::ZERO,
                };
                json!({
                    "category_id": c.id,
                    "category_name": c.name,
                    "total_amount": total.map(money).unwrap_or(Value::Null),
                    "percentage": percentage.to_f64().unwrap_or_default(),
                })
            })
            .collect();
        RawResponse::json(200, &Value::Array(stats))
    }

    fn get_outcome(&self, user_id: i64, id: i64) -> RawResponse {
        let Some(outcome) = self
            .outcomes
            .iter()
            .find(|o| o.id == id && o.user_id == user_id)
        else {
            return RawResponse::json(404, &json!({"message": "Outcome not found"}));
        };
        let mut value = Self::outcome_json(outcome);
        if let Some(category) = self.categories.iter().find(|c| c.id == outcome.category_id) {
            value["category"] = Self::category_json(category);
        }
        RawResponse::json(200, &value)
    }

    /// Validates `amount` and `category` for create (all required) or edit (partial).
    fn outcome_fields(
        &self,
        user_id: i64,
        body: &Value,
        partial: bool,
    ) -> std::result::Result<(Option<Decimal>, Option<i64>), RawResponse> {
        let amount = match body.get("amount") {
            None if partial => None,
            raw => {
                let amount = parse_amount(raw)?;
                if !amount.is_positive() {
                    return Err(field_error("amount", "Amount must be greater than zero."));
                }
                Some(amount.value())
            }
        };
        let category = match body.get("category") {
            None if partial => None,
            None | Some(Value::Null) => return Err(field_error("category", REQUIRED)),
            Some(raw) => {
                let id = raw
                    .as_i64()
                    .or_else(|| raw.as_str().and_then(|s| s.parse().ok()));
                let owned = id.filter(|id| {
                    self.categories
                        .iter()
                        .any(|c| c.id == *id && c.user_id == user_id)
                });
                match owned {
                    Some(id) => Some(id),
                    None => {
                        return Err(field_error(
                            "category",
                            &format!("Invalid pk \"{raw}\" - object does not exist."),
                        ))
                    }
                }
            }
        };
        Ok((amount, category))
    }

    /// Saving an outcome debits the owner's balance.
    fn add_outcome(&mut self, user_id: i64, body: &Value) -> RawResponse {
        let (amount, category_id) = match self.outcome_fields(user_id, body, false) {
            Ok((Some(amount), Some(category_id))) => (amount, category_id),
            Ok(_) => return field_error("amount", REQUIRED),
            Err(response) => return response,
        };
        let id = self.id();
        let outcome = OutcomeRow {
            id,
            amount,
            user_id,
            category_id,
            created_at: Utc::now(),
        };
        let outcome_json = json!({"id": id, "amount": money(amount), "category": category_id});
        self.outcomes.push(outcome);
        let balance = match self.user_mut(user_id) {
            Some(user) => {
                user.balance -= amount;
                user.balance
            }
            None => return not_found(),
        };
        RawResponse::json(201, &json!({"outcome": outcome_json, "balance": money(balance)}))
    }

    fn edit_outcome(&mut self, user_id: i64, id: i64, body: &Value) -> RawResponse {
        if !self
            .outcomes
            .iter()
            .any(|o| o.id == id && o.user_id == user_id)
        {
            return RawResponse::json(404, &json!({"message": "Outcome not found"}));
        }
        let (amount, category_id) = match self.outcome_fields(user_id, body, true) {
            Ok(fields) => fields,
            Err(response) => return response,
        };
        let mut delta = Decimal::ZERO;
        let mut value = Value::Null;
        if let Some(outcome) = self
            .outcomes
            .iter_mut()
            .find(|o| o.id == id && o.user_id == user_id)
        {
            if let Some(amount) = amount {
                delta = outcome.amount - amount;
                outcome.amount = amount;
            }
            if let Some(category_id) = category_id {
                outcome.category_id = category_id;
            }
            value = json!({
                "id": outcome.id,
                "amount": money(outcome.amount),
                "category": outcome.category_id,
            });
        }
        if let Some(user) = self.user_mut(user_id) {
            user.balance += delta;
        }
        RawResponse::json(200, &value)
    }

    fn delete_outcome(&mut self, user_id: i64, id: i64) -> RawResponse {
        let before = self.outcomes.len();
        self.outcomes.retain(|o| !(o.id == id && o.user_id == user_id));
        if self.outcomes.len() == before {
            return not_found();
        }
        RawResponse::new(204, "")
    }

    fn user_data(&mut self, user_id: i64) -> RawResponse {
        match self.user_mut(user_id) {
            Some(user) => RawResponse::json(
                200,
                &json!({
                    "email": user.email,
                    "username": user.username,
                    "phone_number": user.phone_number,
                }),
            ),
            None => not_found(),
        }
    }

    fn update_profile(&mut self, user_id: i64, body: &Value) -> RawResponse {
        let Some(user) = self.user_mut(user_id) else {
            return not_found();
        };
        let text = |name: &str| body.get(name).and_then(Value::as_str).map(str::to_string);
        if let Some(username) = text("username") {
            user.username = username;
        }
        if let Some(email) = text("email") {
            user.email = email;
        }
        if let Some(phone_number) = text("phone_number") {
            user.phone_number = phone_number;
        }
        if let Some(first_name) = text("first_name") {
            user.first_name = first_name;
        }
        if let Some(last_name) = text("last_name") {
            user.last_name = last_name;
        }
        RawResponse::json(
            200,
            &json!({
                "id": user.id,
                "email": user.email,
                "phone_number": user.phone_number,
                "username": user.username,
                "first_name": user.first_name,
                "last_name": user.last_name,
            }),
        )
    }
}

fn query_param<'a>(request: &'a ApiRequest, name: &str) -> Option<&'a str> {
    request
        .query
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

fn parse_amount(raw: Option<&Value>) -> std::result::Result<Amount, RawResponse> {
    match raw {
        None | Some(Value::Null) => Err(field_error("amount", REQUIRED)),
        Some(value) => serde_json::from_value::<Amount>(value.clone())
            .map_err(|_| field_error("amount", "A valid number is required.")),
    }
}

fn required_name(body: &Value) -> std::result::Result<String, RawResponse> {
    match body.get("name").and_then(Value::as_str) {
        None => Err(field_error("name", REQUIRED)),
        Some(name) if name.trim().is_empty() => Err(field_error("name", BLANK)),
        Some(name) => Ok(name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::classify;

    fn request(method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> ApiRequest {
        let mut headers = Vec::new();
        if let Some(token) = token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        ApiRequest {
            method,
            path: path.to_string(),
            query: Vec::new(),
            headers,
            body: body.map(|b| b.to_string()),
        }
    }

    #[tokio::test]
    async fn test_requires_token() {
        let server = TestServer::default();
        let response = server
            .send(&request(Method::Get, "list-categories/", None, None))
            .await
            .unwrap();
        assert_eq!(response.status, 401);
    }

    #[tokio::test]
    async fn test_sign_in_issues_token() {
        let server = TestServer::default();
        let body = json!({"username": "demo", "password": "demo-password"});
        let response = server
            .send(&request(Method::Post, "sign-in/", None, Some(body)))
            .await
            .unwrap();
        let value = classify(response).unwrap();
        assert_eq!(value["tokens"]["access"], "test-access-demo");
    }

    #[tokio::test]
    async fn test_statistics_percentages() {
        let server = TestServer::default();
        let token = token_for("demo");
        let response = server
            .send(&request(
                Method::Get,
                "list-outcomes-with-statistics/",
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        let value = classify(response).unwrap();
        let stats = value.as_array().unwrap();
        assert_eq!(stats.len(), 3);
        let sum: f64 = stats.iter().map(|s| s["percentage"].as_f64().unwrap()).sum();
        assert!((sum - 100.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_respond_next_overrides_routing() {
        let server = TestServer::default();
        server.respond_next(RawResponse::new(500, "boom"));
        let response = server
            .send(&request(Method::Get, "get-balance/", None, None))
            .await
            .unwrap();
        assert_eq!(response, RawResponse::new(500, "boom"));
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_poisoned_state_still_serves() {
        let server = TestServer::default();
        let state = server.state.clone();
        let _ = std::thread::spawn(move || {
            let _guard = state.lock().unwrap();
            panic!("poison the state");
        })
        .join();
        server.respond_next(RawResponse::new(204, ""));
        let response = server
            .send(&request(Method::Get, "get-balance/", None, None))
            .await
            .unwrap();
        assert_eq!(response, RawResponse::new(204, ""));
        assert_eq!(server.requests().len(), 1);
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("get-outcome/3/"), Some(("get-outcome", Some(3))));
        assert_eq!(split_path("list-outcomes/"), Some(("list-outcomes", None)));
        assert_eq!(split_path("get-outcome/abc/"), None);
        assert_eq!(split_path("a/1/b/"), None);
    }
}
