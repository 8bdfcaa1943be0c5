use std::io;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use saw_ranker_core::SawRanker;
use saw_ranker_dataset::{BrowseQuery, Dataset, DatasetError, DatasetSource};
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::api::{self, CalculateRequest, CalculateResponse};
use crate::config::ServerConfig;
use crate::http::{percent_decode, read_http_request, write_http_response, HttpRequest, HttpResponse};
use crate::metrics::MetricsRegistry;

const PACKAGE_PREFIX: &str = "/api/packages/";
const MAX_CATEGORY_LABELS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Health,
    Metrics,
    Criteria,
    Packages,
    Package,
    Categories,
    Statistics,
    Calculate,
}

impl Route {
    fn resolve(path: &str) -> Option<Self> {
        let route = match path {
            "/health" => Self::Health,
            "/metrics" => Self::Metrics,
            "/api/criteria" => Self::Criteria,
            "/api/packages" => Self::Packages,
            "/api/categories" => Self::Categories,
            "/api/statistics" => Self::Statistics,
            "/api/calculate" => Self::Calculate,
            _ if path.starts_with(PACKAGE_PREFIX) => Self::Package,
            _ => return None,
        };
        Some(route)
    }

    fn label(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Metrics => "metrics",
            Self::Criteria => "criteria",
            Self::Packages => "packages",
            Self::Package => "package",
            Self::Categories => "categories",
            Self::Statistics => "statistics",
            Self::Calculate => "calculate",
        }
    }

    fn method(self) -> &'static str {
        match self {
            Self::Calculate => "POST",
            _ => "GET",
        }
    }
}

/// HTTP front of the ranker: serves the dataset and ranks on request.
pub struct RankerServer {
    config: ServerConfig,
    source: DatasetSource,
    ranker: SawRanker,
    metrics: Mutex<MetricsRegistry>,
}

impl RankerServer {
    /// Server over the configured dataset file; the file is read on first use.
    pub fn new(config: ServerConfig) -> Self {
        let source = DatasetSource::new(config.dataset_path.clone());
        Self::with_source(config, source)
    }

    pub fn with_source(config: ServerConfig, source: DatasetSource) -> Self {
        Self {
            config,
            source,
            ranker: SawRanker::default(),
            metrics: Mutex::new(MetricsRegistry::new(MAX_CATEGORY_LABELS)),
        }
    }

    /// In-memory dataset with default settings.
    pub fn from_dataset(dataset: Dataset) -> Self {
        Self::with_source(ServerConfig::default(), DatasetSource::from_dataset(dataset))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Loads the dataset now and returns its package count.
    pub fn preload(&self) -> Result<usize, DatasetError> {
        self.source.snapshot().map(|dataset| dataset.len())
    }

    pub fn serve_http(&self) -> io::Result<()> {
        let listener = TcpListener::bind(&self.config.http_addr)?;
        info!(
            addr = %listener.local_addr()?,
            dataset = %self.config.dataset_path.display(),
            "saw-ranker http listening"
        );
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Err(err) = self.handle_http_connection(stream) {
                        warn!(error = %err, "http request error");
                    }
                }
                Err(err) => {
                    warn!(error = %err, "http accept error");
                }
            }
        }
        Ok(())
    }

    fn handle_http_connection(&self, mut stream: TcpStream) -> io::Result<()> {
        let req = match read_http_request(&stream) {
            Ok(Some(req)) => req,
            Ok(None) => return Ok(()),
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                let response = HttpResponse::json(400, api::failure(err.to_string()));
                return write_http_response(&mut stream, &response);
            }
            Err(err) => return Err(err),
        };
        let response = self.dispatch(&req);
        write_http_response(&mut stream, &response)
    }

    /// Routes one request and records its outcome.
    pub fn dispatch(&self, req: &HttpRequest) -> HttpResponse {
        let started = Instant::now();
        let (label, response) = match Route::resolve(&req.path) {
            Some(route) if req.method != route.method() => (
                route.label(),
                HttpResponse::json(
                    405,
                    api::failure(format!(
                        "method {} not allowed on {}; use {}",
                        req.method,
                        req.path,
                        route.method()
                    )),
                ),
            ),
            Some(route) => (route.label(), self.handle(route, req)),
            None => (
                "not_found",
                HttpResponse::json(404, api::failure(format!("route not found: {}", req.path))),
            ),
        };

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.metrics
            .lock()
            .record_route(label, latency_ms, !response.is_success());
        debug!(
            method = %req.method,
            path = %req.path,
            status = response.status,
            latency_ms,
            "handled request"
        );
        response
    }

    fn handle(&self, route: Route, req: &HttpRequest) -> HttpResponse {
        match route {
            Route::Health => HttpResponse::json(200, json!({"status": "ok"})),
            Route::Metrics => HttpResponse::text(
                200,
                "text/plain; version=0.0.4; charset=utf-8",
                self.render_metrics_text(),
            ),
            Route::Criteria => HttpResponse::json(200, api::criteria_body(self.ranker.registry())),
            Route::Packages => self.with_dataset(|dataset| self.handle_browse(&dataset, req)),
            Route::Package => self.with_dataset(|dataset| handle_lookup(&dataset, req)),
            Route::Categories => self.with_dataset(|dataset| {
                HttpResponse::json(200, api::success("categories", json!(dataset.categories())))
            }),
            Route::Statistics => self.with_dataset(|dataset| {
                HttpResponse::json(200, api::success("statistics", json!(dataset.statistics())))
            }),
            Route::Calculate => self.handle_calculate(req),
        }
    }

    fn with_dataset<F>(&self, handler: F) -> HttpResponse
    where
        F: FnOnce(Arc<Dataset>) -> HttpResponse,
    {
        match self.source.snapshot() {
            Ok(dataset) => handler(dataset),
            Err(err) => {
                error!(error = %err, "dataset unavailable");
                HttpResponse::json(500, api::failure(format!("dataset unavailable: {err}")))
            }
        }
    }

    fn handle_browse(&self, dataset: &Dataset, req: &HttpRequest) -> HttpResponse {
        let query = BrowseQuery {
            page: req
                .query_param("page")
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(1),
            limit: self.config.effective_limit(req.query_param("limit")),
            category: non_blank(req.query_param("category")),
            search: non_blank(req.query_param("search")),
        };
        let page = dataset.browse(&query);
        HttpResponse::json(
            200,
            json!({
                "success": true,
                "data": page.data,
                "pagination": page.pagination,
            }),
        )
    }

    fn handle_calculate(&self, req: &HttpRequest) -> HttpResponse {
        let request = match CalculateRequest::parse(&req.body) {
            Ok(v) => v,
            Err(err) => {
                return HttpResponse::json(
                    400,
                    api::failure(format!("invalid request body: {err}")),
                );
            }
        };
        let weights = request
            .weights
            .clone()
            .unwrap_or_else(|| self.ranker.default_weights());
        if let Err(err) = weights.validate() {
            self.metrics.lock().record_rank_rejected();
            return HttpResponse::json(400, api::failure(err.to_string()));
        }

        let category = request.category();
        self.with_dataset(|dataset| {
            let items = dataset.in_category(category);
            match self.ranker.rank(&items, &weights) {
                Ok(results) => {
                    self.metrics.lock().record_rank(category, results.len());
                    info!(
                        category = category.unwrap_or("all"),
                        ranked = results.len(),
                        "calculated ranking"
                    );
                    HttpResponse::json(200, json!(CalculateResponse::new(&results)))
                }
                Err(err) => {
                    self.metrics.lock().record_rank_rejected();
                    HttpResponse::json(400, api::failure(err.to_string()))
                }
            }
        })
    }

    fn render_metrics_text(&self) -> String {
        let packages = self.source.snapshot().map(|d| d.len()).unwrap_or(0);
        self.metrics
            .lock()
            .render(self.source.load_count(), packages)
    }
}

fn handle_lookup(dataset: &Dataset, req: &HttpRequest) -> HttpResponse {
    let raw = req.path.strip_prefix(PACKAGE_PREFIX).unwrap_or_default();
    let name = percent_decode(raw);
    if name.trim().is_empty() {
        return HttpResponse::json(400, api::failure("package name is required"));
    }
    match dataset.find_by_name(&name) {
        Some(item) => HttpResponse::json(200, api::success("data", json!(item))),
        None => HttpResponse::json(404, api::failure(format!("package not found: {name}"))),
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
