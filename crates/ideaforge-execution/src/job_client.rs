//! ReasoningJobClient - submits work to the remote reasoning service and polls
//! it to a terminal state.
//!
//! Every job gets a brand-new remote session; nothing is shared between jobs.
//! A job is bounded by a wall-clock deadline covering submission and polling,
//! an optional attempt budget, and a caller-supplied [`CancellationToken`].
//! Whichever fires first stops the job; once a run exists the service is
//! asked to cancel it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ideaforge_core::reasoning::{JobStatus, ReasoningJob, ReasoningService};
use ideaforge_core::session::MessageRole;
use ideaforge_core::{ForgeError, Result};
use tokio::time::{Instant, sleep, sleep_until, timeout};
use tokio_util::sync::CancellationToken;

use crate::JOB_EVENT_TARGET;
use crate::poll_policy::PollPolicy;

/// Upper bound on the best-effort remote cancellation request.
const CANCEL_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Job ID reported when a job stops before the remote run was created.
pub const UNSUBMITTED_JOB_ID: &str = "<unsubmitted>";

/// Why local polling stopped before a terminal status arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    Cancelled,
    Deadline,
    AttemptsExhausted,
}

/// Runs reasoning jobs against a [`ReasoningService`].
#[derive(Clone)]
pub struct ReasoningJobClient {
    service: Arc<dyn ReasoningService>,
    policy: PollPolicy,
}

impl ReasoningJobClient {
    /// Creates a client with the default polling policy.
    pub fn new(service: Arc<dyn ReasoningService>) -> Self {
        Self {
            service,
            policy: PollPolicy::default(),
        }
    }

    /// Overrides the polling policy.
    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Opens a remote session, posts `prompt` and starts a run of `agent_id`.
    ///
    /// Nothing is sent when `cancel` has already fired. Each remote call is
    /// bounded by the policy deadline.
    pub async fn submit(
        &self,
        prompt: &str,
        agent_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ReasoningJob> {
        let started = Instant::now();
        let deadline_at = self.deadline_from(started)?;
        self.submit_until(prompt, agent_id, cancel, started, deadline_at)
            .await
    }

    async fn submit_until(
        &self,
        prompt: &str,
        agent_id: &str,
        cancel: &CancellationToken,
        started: Instant,
        deadline_at: Instant,
    ) -> Result<ReasoningJob> {
        let unsubmitted = |interrupt| unsubmitted_error(interrupt, started);
        if cancel.is_cancelled() {
            return Err(unsubmitted(Interrupt::Cancelled));
        }

        let session_id = race(self.service.create_session(None), cancel, deadline_at)
            .await
            .map_err(unsubmitted)??;
        race(
            self.service
                .post_message(&session_id, MessageRole::User, prompt),
            cancel,
            deadline_at,
        )
        .await
        .map_err(unsubmitted)??;
        let run_id = race(
            self.service.create_run(&session_id, agent_id),
            cancel,
            deadline_at,
        )
        .await
        .map_err(unsubmitted)??;

        tracing::info!(
            target: JOB_EVENT_TARGET,
            job_id = %run_id,
            session_id = %session_id,
            agent_id = %agent_id,
            "Job submitted"
        );
        Ok(ReasoningJob::queued(run_id, session_id, agent_id))
    }

    /// Polls `job` until it reaches a terminal state and returns the final
    /// assistant message.
    ///
    /// # Errors
    ///
    /// - `RemoteJobTerminal` if the run ended `failed`, `cancelled` or `expired`
    /// - `Cancelled`, `DeadlineExceeded` or `AttemptsExhausted` if polling was
    ///   stopped locally; the remote run is asked to cancel in those cases
    /// - `Remote` if any single service call fails (not retried here)
    pub async fn await_completion(
        &self,
        job: &mut ReasoningJob,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let started = Instant::now();
        let deadline_at = self.deadline_from(started)?;
        self.await_until(job, cancel, started, deadline_at).await
    }

    async fn await_until(
        &self,
        job: &mut ReasoningJob,
        cancel: &CancellationToken,
        started: Instant,
        deadline_at: Instant,
    ) -> Result<String> {
        let mut checks: u32 = 0;

        loop {
            let status = match race(
                self.service.get_run_status(&job.id, &job.session_id),
                cancel,
                deadline_at,
            )
            .await
            {
                Ok(status) => JobStatus::from(status?),
                Err(interrupt) => return Err(self.abandon(job, interrupt, started, checks).await),
            };
            checks += 1;
            job.status = status;

            tracing::debug!(
                target: JOB_EVENT_TARGET,
                job_id = %job.id,
                check = checks,
                status = %status,
                "Polled job status"
            );

            match status {
                JobStatus::Completed => {
                    let text = match race(self.final_message(job), cancel, deadline_at).await {
                        Ok(text) => text?,
                        Err(interrupt) => {
                            return Err(self.abandon(job, interrupt, started, checks).await);
                        }
                    };
                    job.raw_result = Some(text.clone());
                    tracing::info!(
                        target: JOB_EVENT_TARGET,
                        job_id = %job.id,
                        checks = checks,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Job completed"
                    );
                    return Ok(text);
                }
                terminal if terminal.is_unsuccessful() => {
                    tracing::warn!(
                        target: JOB_EVENT_TARGET,
                        job_id = %job.id,
                        status = %terminal,
                        "Job ended unsuccessfully"
                    );
                    return Err(ForgeError::RemoteJobTerminal {
                        job_id: job.id.clone(),
                        status: terminal,
                    });
                }
                _ => {}
            }

            if self.policy.attempts_exhausted(checks) {
                return Err(self
                    .abandon(job, Interrupt::AttemptsExhausted, started, checks)
                    .await);
            }

            let delay = self.policy.delay_after(checks);
            if let Err(interrupt) = race(sleep(delay), cancel, deadline_at).await {
                return Err(self.abandon(job, interrupt, started, checks).await);
            }
        }
    }

    /// Submits `prompt` and waits for the result.
    ///
    /// The policy deadline covers the whole job, submission included.
    pub async fn run(
        &self,
        prompt: &str,
        agent_id: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let started = Instant::now();
        let deadline_at = self.deadline_from(started)?;
        let mut job = self
            .submit_until(prompt, agent_id, cancel, started, deadline_at)
            .await?;
        self.await_until(&mut job, cancel, started, deadline_at)
            .await
    }

    fn deadline_from(&self, started: Instant) -> Result<Instant> {
        started.checked_add(self.policy.deadline).ok_or_else(|| {
            ForgeError::configuration(format!(
                "polling deadline of {:?} is out of range",
                self.policy.deadline
            ))
        })
    }

    /// Text of the most recent assistant message in the job's session.
    async fn final_message(&self, job: &ReasoningJob) -> Result<String> {
        let messages = self.service.list_messages(&job.session_id).await?;
        messages
            .into_iter()
            .rev()
            .find(|message| message.role == MessageRole::Assistant)
            .map(|message| message.content)
            .ok_or_else(|| {
                ForgeError::response_parse(format!(
                    "job {} completed without an assistant message",
                    job.id
                ))
            })
    }

    /// Stops tracking `job`, requests remote cancellation and builds the error.
    ///
    /// A run already reported `completed` is left alone remotely.
    async fn abandon(
        &self,
        job: &ReasoningJob,
        interrupt: Interrupt,
        started: Instant,
        checks: u32,
    ) -> ForgeError {
        if job.status == JobStatus::Completed {
            tracing::warn!(
                target: JOB_EVENT_TARGET,
                job_id = %job.id,
                reason = ?interrupt,
                "Abandoning completed job before its result was read"
            );
        } else {
            tracing::warn!(
                target: JOB_EVENT_TARGET,
                job_id = %job.id,
                reason = ?interrupt,
                checks = checks,
                "Abandoning job, requesting remote cancellation"
            );
            self.request_cancel(job).await;
        }

        interrupt_error(interrupt, job.id.clone(), started, checks)
    }

    async fn request_cancel(&self, job: &ReasoningJob) {
        match timeout(
            CANCEL_REQUEST_TIMEOUT,
            self.service.cancel_run(&job.id, &job.session_id),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::warn!(target: JOB_EVENT_TARGET, job_id = %job.id, "Remote cancellation failed: {}", err);
            }
            Err(_) => {
                tracing::warn!(target: JOB_EVENT_TARGET, job_id = %job.id, "Remote cancellation timed out");
            }
        }
    }
}

/// Error for a job stopped before the remote run existed.
fn unsubmitted_error(interrupt: Interrupt, started: Instant) -> ForgeError {
    tracing::warn!(
        target: JOB_EVENT_TARGET,
        reason = ?interrupt,
        "Job stopped before submission finished"
    );
    interrupt_error(interrupt, UNSUBMITTED_JOB_ID.to_string(), started, 0)
}

fn interrupt_error(interrupt: Interrupt, job_id: String, started: Instant, checks: u32) -> ForgeError {
    match interrupt {
        Interrupt::Cancelled => ForgeError::Cancelled { job_id },
        Interrupt::Deadline => ForgeError::DeadlineExceeded {
            job_id,
            elapsed_ms: started.elapsed().as_millis() as u64,
        },
        Interrupt::AttemptsExhausted => ForgeError::AttemptsExhausted {
            job_id,
            attempts: checks,
        },
    }
}

/// Runs `fut` unless the caller cancels or the deadline passes first.
async fn race<F, T>(
    fut: F,
    cancel: &CancellationToken,
    deadline_at: Instant,
) -> std::result::Result<T, Interrupt>
where
    F: Future<Output = T>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupt::Cancelled),
        _ = sleep_until(deadline_at) => Err(Interrupt::Deadline),
        out = fut => Ok(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ideaforge_core::reasoning::{RemoteMessage, RunStatus};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Call that never resolves.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Stall {
        CreateSession,
        ListMessages,
    }

    /// Reasoning service double replaying a scripted list of statuses.
    ///
    /// Once the script runs out the last status repeats.
    struct ScriptedService {
        statuses: Mutex<VecDeque<RunStatus>>,
        last: Mutex<RunStatus>,
        reply: String,
        stall: Option<Stall>,
        sessions_opened: AtomicU32,
        runs_started: AtomicU32,
        status_checks: AtomicU32,
        cancel_calls: AtomicU32,
        posted: Mutex<Vec<String>>,
    }

    impl ScriptedService {
        fn new(statuses: Vec<RunStatus>, reply: &str) -> Arc<Self> {
            let last = *statuses.last().unwrap_or(&RunStatus::Queued);
            Arc::new(Self {
                statuses: Mutex::new(statuses.into()),
                last: Mutex::new(last),
                reply: reply.to_string(),
                stall: None,
                sessions_opened: AtomicU32::new(0),
                runs_started: AtomicU32::new(0),
                status_checks: AtomicU32::new(0),
                cancel_calls: AtomicU32::new(0),
                posted: Mutex::new(Vec::new()),
            })
        }

        fn running_then_completed(n: usize, reply: &str) -> Arc<Self> {
            let mut statuses = vec![RunStatus::InProgress; n];
            statuses.push(RunStatus::Completed);
            Self::new(statuses, reply)
        }

        fn stalling(stall: Stall) -> Arc<Self> {
            let mut service = Arc::into_inner(Self::running_then_completed(0, "late"))
                .expect("fresh service has one owner");
            service.stall = Some(stall);
            Arc::new(service)
        }

        async fn maybe_stall(&self, at: Stall) {
            if self.stall == Some(at) {
                std::future::pending::<()>().await;
            }
        }
    }

    #[async_trait]
    impl ReasoningService for ScriptedService {
        async fn create_session(&self, _system_context: Option<&str>) -> Result<String> {
            self.maybe_stall(Stall::CreateSession).await;
            self.sessions_opened.fetch_add(1, Ordering::SeqCst);
            Ok("thread_1".to_string())
        }

        async fn post_message(&self, _session_id: &str, _role: MessageRole, text: &str) -> Result<()> {
            self.posted.lock().unwrap().push(text.to_string());
            Ok(())
        }

        async fn create_run(&self, _session_id: &str, _agent_id: &str) -> Result<String> {
            self.runs_started.fetch_add(1, Ordering::SeqCst);
            Ok("run_1".to_string())
        }

        async fn get_run_status(&self, _run_id: &str, _session_id: &str) -> Result<RunStatus> {
            self.status_checks.fetch_add(1, Ordering::SeqCst);
            let next = self.statuses.lock().unwrap().pop_front();
            let mut last = self.last.lock().unwrap();
            if let Some(status) = next {
                *last = status;
            }
            Ok(*last)
        }

        async fn list_messages(&self, _session_id: &str) -> Result<Vec<RemoteMessage>> {
            self.maybe_stall(Stall::ListMessages).await;
            Ok(vec![
                RemoteMessage::new(MessageRole::User, "prompt"),
                RemoteMessage::new(MessageRole::Assistant, "draft"),
                RemoteMessage::new(MessageRole::Assistant, self.reply.clone()),
            ])
        }

        async fn cancel_run(&self, _run_id: &str, _session_id: &str) -> Result<()> {
            self.cancel_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn client(service: Arc<ScriptedService>, policy: PollPolicy) -> ReasoningJobClient {
        ReasoningJobClient::new(service).with_policy(policy)
    }

    fn one_second_polls() -> PollPolicy {
        PollPolicy::fixed(Duration::from_secs(1), Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_completed_and_returns_last_assistant_message() {
        for n in [0usize, 1, 4] {
            let service = ScriptedService::running_then_completed(n, "final answer");
            let client = client(service.clone(), PollPolicy::default());

            let text = client
                .run("classify this", "asst_1", &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(text, "final answer");
            assert_eq!(service.status_checks.load(Ordering::SeqCst), n as u32 + 1);
            assert_eq!(service.cancel_calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_posts_prompt_into_fresh_session() {
        let service = ScriptedService::running_then_completed(0, "ok");
        let client = client(service.clone(), PollPolicy::default());

        let mut job = client
            .submit("hello remote", "asst_1", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.session_id, "thread_1");
        assert_eq!(service.posted.lock().unwrap().as_slice(), ["hello remote"]);

        client
            .await_completion(&mut job, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.raw_result.as_deref(), Some("ok"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_failure_carries_status() {
        for (wire, expected) in [
            (RunStatus::Failed, JobStatus::Failed),
            (RunStatus::Cancelled, JobStatus::Cancelled),
            (RunStatus::Expired, JobStatus::Expired),
        ] {
            let service = ScriptedService::new(vec![RunStatus::Queued, wire], "unused");
            let client = client(service.clone(), PollPolicy::default());

            let err = client
                .run("p", "asst_1", &CancellationToken::new())
                .await
                .unwrap_err();

            match err {
                ForgeError::RemoteJobTerminal { status, .. } => assert_eq!(status, expected),
                other => panic!("unexpected error: {other:?}"),
            }
            assert_eq!(service.status_checks.load(Ordering::SeqCst), 2);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_stops_polling_and_cancels_remote_run() {
        let service = ScriptedService::new(vec![RunStatus::InProgress], "unused");
        let policy = PollPolicy::fixed(Duration::from_secs(1), Duration::from_millis(3500));
        let client = client(service.clone(), policy);

        let err = client
            .run("p", "asst_1", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ForgeError::DeadlineExceeded { .. }));
        // checks at t=0, 1, 2, 3; deadline fires during the sleep before t=4
        assert_eq!(service.status_checks.load(Ordering::SeqCst), 4);
        assert_eq!(service.cancel_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_budget_stops_polling() {
        let service = ScriptedService::new(vec![RunStatus::Queued], "unused");
        let client = client(service.clone(), one_second_polls().with_max_attempts(3));

        let err = client
            .run("p", "asst_1", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ForgeError::AttemptsExhausted { attempts: 3, .. }));
        assert_eq!(service.status_checks.load(Ordering::SeqCst), 3);
        assert_eq!(service.cancel_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_caller_cancellation_mid_poll() {
        let service = ScriptedService::new(vec![RunStatus::InProgress], "unused");
        let client = client(service.clone(), one_second_polls());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(2500)).await;
            trigger.cancel();
        });

        let err = client.run("p", "asst_1", &cancel).await.unwrap_err();

        assert!(matches!(err, ForgeError::Cancelled { .. }));
        assert_eq!(service.status_checks.load(Ordering::SeqCst), 3);
        assert_eq!(service.cancel_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pre_cancelled_token_starts_nothing_remotely() {
        let service = ScriptedService::running_then_completed(2, "unused");
        let client = client(service.clone(), PollPolicy::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = client.run("p", "asst_1", &cancel).await.unwrap_err();

        assert!(matches!(err, ForgeError::Cancelled { ref job_id } if job_id == UNSUBMITTED_JOB_ID));
        assert_eq!(service.sessions_opened.load(Ordering::SeqCst), 0);
        assert_eq!(service.runs_started.load(Ordering::SeqCst), 0);
        assert_eq!(service.cancel_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_polling_cancels_submitted_run() {
        let service = ScriptedService::running_then_completed(2, "unused");
        let client = client(service.clone(), PollPolicy::default());
        let mut job = client
            .submit("p", "asst_1", &CancellationToken::new())
            .await
            .unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = client.await_completion(&mut job, &cancel).await.unwrap_err();

        assert!(err.is_abandoned());
        assert_eq!(service.status_checks.load(Ordering::SeqCst), 0);
        assert_eq!(service.cancel_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_covers_stalled_submission() {
        let service = ScriptedService::stalling(Stall::CreateSession);
        let policy = PollPolicy::fixed(Duration::from_secs(1), Duration::from_secs(5));
        let client = client(service.clone(), policy);

        let started = Instant::now();
        let outcome = timeout(
            Duration::from_secs(3600),
            client.run("p", "asst_1", &CancellationToken::new()),
        )
        .await
        .expect("run must return within its deadline");

        assert!(matches!(outcome, Err(ForgeError::DeadlineExceeded { .. })));
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert!(started.elapsed() < Duration::from_secs(6));
        assert_eq!(service.runs_started.load(Ordering::SeqCst), 0);
        assert_eq!(service.cancel_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_run_is_not_cancelled_remotely() {
        let service = ScriptedService::stalling(Stall::ListMessages);
        let policy = PollPolicy::fixed(Duration::from_secs(1), Duration::from_secs(5));
        let client = client(service.clone(), policy);

        let err = client
            .run("p", "asst_1", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ForgeError::DeadlineExceeded { ref job_id, .. } if job_id == "run_1"));
        assert_eq!(service.status_checks.load(Ordering::SeqCst), 1);
        assert_eq!(service.cancel_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_out_of_range_deadline_is_a_configuration_error() {
        let service = ScriptedService::running_then_completed(0, "unused");
        let policy = PollPolicy::fixed(Duration::from_secs(1), Duration::MAX);
        let client = client(service, policy);

        let err = client.deadline_from(Instant::now()).unwrap_err();
        assert!(err.is_configuration());
    }
}
