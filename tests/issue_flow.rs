//! Full runs against a mock portal and hub sharing one server.

use anyhow::{anyhow, Result};
use ecarte::{
    config::Config,
    orchestrator::{Credentials, IssueCard, ListHistory, Orchestrator},
    portal::{HistoryEntry, Validity},
    secure3ds::{Prompt, StepUpOutcome},
    Error,
};
use secrecy::SecretString;
use serde_json::json;
use std::{cell::RefCell, net::TcpListener, time::Duration};
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_PAGE_3DS: &str = r#"
    <input type="hidden" name="token" value="antireplay-42">
    <form id="form-3ds-authentificate">
      <input name="MD" value="merchant-data">
      <input name="PaReq" value="pa-request">
      <input name="TermUrl" value="https://portal/receive3ds">
    </form>"#;

const CARD_PAGE: &str = r#"
    <dl><dd id="generated-code-dd"><span data-drag-txt="4970123456789012">4970 **** **** 9012</span></dd></dl>
    <dl id="content-expiration-date"><dt>Expiration</dt><dd>09/27</dd></dl>
    <dl id="content-cryptogramme"><dd><span class="restricted-only">123</span></dd></dl>
    <dl id="content-card-owner"><dd><span class="restricted-only">ALICE DUPONT</span></dd></dl>"#;

/// Records what the operator was told.
#[derive(Default)]
struct RecordingPrompt {
    notices: RefCell<Vec<String>>,
}

impl Prompt for RecordingPrompt {
    fn notify(&self, message: &str) {
        self.notices.borrow_mut().push(message.to_string());
    }

    fn read_code(&self) -> ecarte::Result<SecretString> {
        Err(Error::Prompt("no terminal in tests".to_string()))
    }
}

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn credentials() -> Credentials {
    Credentials {
        username: "alice".to_string(),
        password: SecretString::from("pw".to_string()),
    }
}

fn orchestrator(server: &MockServer) -> Result<Orchestrator<RecordingPrompt>> {
    let mut config =
        Config::new("sg").with_endpoints(&format!("{}/fr/sg", server.uri()), &server.uri());
    config.poll_interval = Duration::from_millis(1);
    Ok(Orchestrator::new(config, RecordingPrompt::default())?)
}

async fn mount_portal(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/fr/sg/login"))
        .and(body_string_contains("identifiant=alice"))
        .and(body_string_contains("token=9876543210"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "JSESSIONID=cookie-1; Path=/")
                .set_body_string(LOGIN_PAGE_3DS),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/fr/sg/receive3ds"))
        .and(body_string_contains("PaRes=pa-response"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fr/sg/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_hub(server: &MockServer, polls: &[ResponseTemplate]) {
    Mock::given(method("POST"))
        .and(path("/acs-pa-service/pa/paRequest"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "/acs-auth-pages/authent/pages/auth-7f3a"),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/acs-auth-pages/authent/pages/auth-7f3a"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/acs-auth-pages/authent/pages/getSession/auth-7f3a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accountId": "acct-1",
            "hubSessionId": "hub-session-1"
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/acs-auth-pages/authent/pages/startAuthent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meansToUse": "MOBILE_APP",
            "hubAuthenticationOutput": {"id": "challenge-9"}
        })))
        .mount(server)
        .await;

    // Earlier mocks are exhausted first, the last one answers every remaining poll.
    for (priority, reply) in (1_u8..).zip(polls) {
        let mock = Mock::given(method("POST"))
            .and(path("/acs-auth-pages/authent/pages/startPolling"))
            .and(body_partial_json(json!({
                "accountId": "acct-1",
                "hubAuthenticationInput": {
                    "authenticationId": "challenge-9",
                    "transactionId": "hub-session-1"
                }
            })))
            .respond_with(reply.clone())
            .with_priority(priority);
        let mock = if usize::from(priority) < polls.len() {
            mock.up_to_n_times(1)
        } else {
            mock
        };
        mock.mount(server).await;
    }

    Mock::given(method("POST"))
        .and(path("/acs-auth-pages/authent/pages/endAuthent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/acs-pa-service/pa/paRequestFromAuthPages"))
        .and(header("Upgrade-Insecure-Requests", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<form><input name="MD" value="md-back"><input name="PaRes" value="pa-response"></form>"#,
        ))
        .mount(server)
        .await;
}

fn poll_reply(flag: Option<&str>) -> ResponseTemplate {
    let mut output = json!({
        "authenticationSuccess": false,
        "authenticationCanceled": false,
        "authenticationBlocked": false,
        "authenticationFailed": false,
        "authenticationTimeOut": false
    });
    if let Some(flag) = flag {
        output[flag] = json!(true);
    }
    ResponseTemplate::new(200).set_body_json(json!({ "hubAuthenticationOutput": output }))
}

#[tokio::test]
async fn issue_card_after_mobile_app_approval() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    mount_portal(&server).await;
    mount_hub(
        &server,
        &[
            poll_reply(None),
            poll_reply(None),
            poll_reply(Some("authenticationSuccess")),
        ],
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/fr/sg/cpn"))
        .and(body_string_contains("request=ocode"))
        .and(body_string_contains("token=antireplay-42"))
        .and(body_string_contains("montant=42"))
        .and(body_string_contains("dateValidite=6"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CARD_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = orchestrator(&server)?;
    let operation = IssueCard {
        amount: "42".parse().map_err(|e: String| anyhow!(e))?,
        currency: "1.000000".to_string(),
        validity: Validity::new(6).map_err(|e| anyhow!(e))?,
    };
    let card = orchestrator.run(&credentials(), operation).await?;

    assert_eq!(card.number, "4970123456789012");
    assert_eq!(card.expiry, "09/27");
    assert_eq!(card.cvv, "123");
    assert_eq!(card.owner, "ALICE DUPONT");

    let polls = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/acs-auth-pages/authent/pages/startPolling")
        .count();
    assert_eq!(polls, 3);
    assert_eq!(
        orchestrator.prompt().notices.borrow().last().map(String::as_str),
        Some("Authentication succeeded")
    );
    Ok(())
}

#[tokio::test]
async fn canceled_approval_stops_before_listing() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/fr/sg/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "JSESSIONID=cookie-1; Path=/")
                .set_body_string(LOGIN_PAGE_3DS),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fr/sg/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/fr/sg/historic"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_hub(&server, &[poll_reply(Some("authenticationCanceled"))]).await;

    let orchestrator = orchestrator(&server)?;
    let result = orchestrator.run(&credentials(), ListHistory).await;

    match result {
        Err(Error::StepUp { outcome, message }) => {
            assert_eq!(outcome, StepUpOutcome::Canceled);
            assert_eq!(message, "Authentication canceled.");
        }
        other => return Err(anyhow!("unexpected result: {other:?}")),
    }
    Ok(())
}

#[tokio::test]
async fn history_without_step_up() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/fr/sg/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "JSESSIONID=cookie-2; Path=/")
                .set_body_string(r#"<input name="token" value="t-1">"#),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/fr/sg/historic"))
        .and(body_string_contains("token=t-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"
            <div id="history-panes-used-numbers-print"><table>
              <tr><th>Date</th></tr>
              <tr><td>02/01/2024</td><td>SHOP</td><td>4970XXXX0001</td><td>10,00</td><td>9,99</td><td>Used</td></tr>
            </table></div>
            <div id="history-panes-unused-numbers-print"><table>
              <tr><td>15/03/2024</td><td>-----------</td><td>4970XXXX0002</td><td>20,00</td><td>-----------</td><td>Unused</td></tr>
            </table></div>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fr/sg/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = orchestrator(&server)?;
    let entries = orchestrator.run(&credentials(), ListHistory).await?;

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0], HistoryEntry::header());
    assert_eq!(entries[1].date, "15/03/2024");
    assert_eq!(entries[1].merchant, "─");
    assert_eq!(entries[2].number, "4970XXXX0001");
    assert!(orchestrator.prompt().notices.borrow().is_empty());
    Ok(())
}
