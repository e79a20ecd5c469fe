pub mod dto;
pub mod mapping;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::{NewEvent, NewTask};

const PAGE_SIZE: u32 = 100;
const MAX_PAGES: usize = 50;

#[async_trait]
pub trait FeedClient: Send + Sync {
    /// `true` only when the upstream accepts the token; never errors.
    async fn validate_token(&self, token: &str) -> bool;
    async fn fetch_courses(&self, token: &str) -> Result<Vec<dto::Course>, AppError>;
    async fn fetch_assignments(&self, token: &str, course_id: &str) -> Result<Vec<dto::Assignment>, AppError>;
    async fn fetch_calendar_events(&self, token: &str, course_id: &str) -> Result<Vec<dto::CalendarEvent>, AppError>;
}

pub struct TecsupHttpClient {
    client: Client,
    base_url: String,
}

impl TecsupHttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::new(
            &config.tecsup_base_url,
            Duration::from_secs(config.tecsup_timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, token: &str, url: &str) -> Result<reqwest::Response, AppError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("TECSUP request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(AppError::InvalidToken);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamUnavailable(format!(
                "TECSUP API error {}: {}",
                status, body
            )));
        }
        Ok(response)
    }

    /// Follows `Link: <...>; rel="next"` until the last page.
    ///
    /// A listing still unfinished after `MAX_PAGES` is an error: a truncated
    /// list would make the sync swap drop the records past the cut.
    async fn get_paginated<T: DeserializeOwned>(&self, token: &str, path: &str) -> Result<Vec<T>, AppError> {
        let mut items = Vec::new();
        let mut next = Some(self.url(path));
        let mut pages = 0;

        while let Some(url) = next.take() {
            let response = self.get(token, &url).await?;
            next = next_link(response.headers());

            let page: Vec<T> = response.json().await.map_err(|e| {
                AppError::UpstreamUnavailable(format!("Failed to parse TECSUP response: {}", e))
            })?;
            items.extend(page);

            pages += 1;
            if pages >= MAX_PAGES && next.is_some() {
                warn!("pagination of {} exceeded {} pages", path, MAX_PAGES);
                return Err(AppError::UpstreamUnavailable(format!(
                    "TECSUP listing {} has more than {} pages",
                    path, MAX_PAGES
                )));
            }
        }

        Ok(items)
    }
}

fn next_link(headers: &header::HeaderMap) -> Option<String> {
    let link = headers.get(header::LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        if !params.contains("rel=\"next\"") {
            return None;
        }
        Some(
            target
                .trim()
                .trim_start_matches('<')
                .trim_end_matches('>')
                .to_string(),
        )
    })
}

#[async_trait]
impl FeedClient for TecsupHttpClient {
    async fn validate_token(&self, token: &str) -> bool {
        match self.get(token, &self.url("/users/self")).await {
            Ok(response) => match response.json::<dto::Profile>().await {
                Ok(profile) => {
                    info!("TECSUP token accepted for upstream user {}", profile.id);
                    true
                }
                Err(e) => {
                    warn!("TECSUP whoami returned an unreadable profile: {}", e);
                    false
                }
            },
            Err(e) => {
                warn!("TECSUP token validation failed: {}", e);
                false
            }
        }
    }

    async fn fetch_courses(&self, token: &str) -> Result<Vec<dto::Course>, AppError> {
        self.get_paginated(token, &format!("/courses?per_page={}", PAGE_SIZE))
            .await
    }

    async fn fetch_assignments(&self, token: &str, course_id: &str) -> Result<Vec<dto::Assignment>, AppError> {
        self.get_paginated(
            token,
            &format!("/courses/{}/assignments?per_page={}", course_id, PAGE_SIZE),
        )
        .await
    }

    async fn fetch_calendar_events(&self, token: &str, course_id: &str) -> Result<Vec<dto::CalendarEvent>, AppError> {
        self.get_paginated(
            token,
            &format!(
                "/calendar_events?context_codes[]=course_{}&all_events=true&per_page={}",
                course_id, PAGE_SIZE
            ),
        )
        .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedResource {
    Assignments,
    CalendarEvents,
    Course,
}

/// One course sub-fetch that failed; recorded, never raised.
#[derive(Debug, Clone, Serialize)]
pub struct CourseFetchError {
    pub course_id: String,
    pub course_name: String,
    pub resource: FeedResource,
    pub message: String,
}

impl CourseFetchError {
    fn new(course: &dto::Course, resource: FeedResource, message: String) -> Self {
        Self {
            course_id: course.id.clone(),
            course_name: course.display_name(),
            resource,
            message,
        }
    }
}

/// Everything pulled from upstream in one pass, mapped but not persisted.
#[derive(Debug, Default)]
pub struct FeedSnapshot {
    pub tasks: Vec<NewTask>,
    pub events: Vec<NewEvent>,
    pub errors: Vec<CourseFetchError>,
    pub courses_total: usize,
    pub courses_succeeded: usize,
}

impl FeedSnapshot {
    pub fn all_courses_failed(&self) -> bool {
        self.courses_total > 0 && self.courses_succeeded == 0
    }
}

/// Fetches every course's assignments and calendar events with at most
/// `concurrency` courses in flight. A failing course is recorded in
/// `errors` and never cancels its siblings; only a failure listing the
/// courses aborts the whole fetch.
pub async fn fetch_all(
    client: Arc<dyn FeedClient>,
    token: &str,
    concurrency: usize,
) -> Result<FeedSnapshot, AppError> {
    let courses = client.fetch_courses(token).await?;
    info!("fetching {} TECSUP courses", courses.len());

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let handles: Vec<_> = courses
        .into_iter()
        .map(|course| {
            let client = client.clone();
            let semaphore = semaphore.clone();
            let token = token.to_string();
            let course_id = course.id.clone();
            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                tokio::join!(
                    client.fetch_assignments(&token, &course_id),
                    client.fetch_calendar_events(&token, &course_id),
                )
            });
            (course, handle)
        })
        .collect();

    let mut snapshot = FeedSnapshot {
        courses_total: handles.len(),
        ..Default::default()
    };

    for (course, handle) in handles {
        let (assignments, events) = match handle.await {
            Ok(results) => results,
            Err(e) => {
                warn!("course {} fetch task aborted: {}", course.id, e);
                snapshot.errors.push(CourseFetchError::new(
                    &course,
                    FeedResource::Course,
                    e.to_string(),
                ));
                continue;
            }
        };

        let mut succeeded = false;

        match assignments {
            Ok(assignments) => {
                succeeded = true;
                snapshot
                    .tasks
                    .extend(assignments.iter().filter_map(mapping::assignment_to_task));
            }
            Err(e) => {
                warn!("failed to fetch assignments for course {}: {}", course.id, e);
                snapshot.errors.push(CourseFetchError::new(
                    &course,
                    FeedResource::Assignments,
                    e.to_string(),
                ));
            }
        }

        match events {
            Ok(events) => {
                succeeded = true;
                snapshot.events.extend(
                    events
                        .iter()
                        .filter_map(|e| mapping::calendar_event_to_event(e, &course)),
                );
            }
            Err(e) => {
                warn!("failed to fetch calendar events for course {}: {}", course.id, e);
                snapshot.errors.push(CourseFetchError::new(
                    &course,
                    FeedResource::CalendarEvents,
                    e.to_string(),
                ));
            }
        }

        if succeeded {
            snapshot.courses_succeeded += 1;
        }
    }

    Ok(snapshot)
}
