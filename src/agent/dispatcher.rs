//! Per-message orchestration: classify, verify, compose, send.
//!
//! Each inbound message runs as its own task; independent messages never
//! serialize behind one another. A second entry point, `execute_action`,
//! routes menu selections to domain handlers which may re-check tier gating
//! and construct wallet-call batches.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use futures::future::join_all;
use tokio::sync::{RwLock, mpsc};

use crate::agent::actions::{ActionCategory, ActionTemplates};
use crate::agent::classifier::IntentClassifier;
use crate::agent::composer::ResponseComposer;
use crate::agent::types::{AccessResult, AccessTier, AgentResponse, Intent};
use crate::agent::verifier::AccessVerifier;
use crate::error::{ActionError, ChainError, Error, MessageStage, Result, TransportError};
use crate::notify::{Notifier, NoopNotifier, NotifyEvent};
use crate::transport::{ContentTag, InboundMessage, MessagingTransport};
use crate::tx::{CommunityAction, TransactionBatch, TransactionBuilder};

const APOLOGY_TEXT: &str =
    "Sorry, something went wrong on our side. Please try again in a moment.";

/// Stake attached to a community membership transaction, in wei.
const COMMUNITY_STAKE_WEI: u64 = 1_000_000_000_000_000;

/// Observer of the classified/verified/composed output for each message.
///
/// Observers are independent: one failing is logged and never blocks the
/// others or the reply.
#[async_trait::async_trait]
pub trait ResponseObserver: Send + Sync {
    async fn on_response(
        &self,
        message: &InboundMessage,
        intent: &Intent,
        access: &AccessResult,
        response: &AgentResponse,
    ) -> Result<()>;
}

pub struct AgentDispatcher {
    agent_address: String,
    classifier: IntentClassifier,
    verifier: Arc<AccessVerifier>,
    composer: ResponseComposer,
    templates: Arc<ActionTemplates>,
    tx_builder: Arc<TransactionBuilder>,
    transport: Arc<dyn MessagingTransport>,
    notifier: Arc<dyn Notifier>,
    observers: RwLock<HashMap<String, Arc<dyn ResponseObserver>>>,
}

impl AgentDispatcher {
    pub fn new(
        agent_address: impl Into<String>,
        verifier: Arc<AccessVerifier>,
        tx_builder: Arc<TransactionBuilder>,
        transport: Arc<dyn MessagingTransport>,
    ) -> Self {
        let templates = Arc::new(ActionTemplates::new());
        Self {
            agent_address: agent_address.into().to_ascii_lowercase(),
            classifier: IntentClassifier::new(),
            verifier,
            composer: ResponseComposer::new(templates.clone()),
            templates,
            tx_builder,
            transport,
            notifier: Arc::new(NoopNotifier),
            observers: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub async fn register_observer(&self, id: impl Into<String>, observer: Arc<dyn ResponseObserver>) {
        self.observers.write().await.insert(id.into(), observer);
    }

    pub async fn unregister_observer(&self, id: &str) {
        self.observers.write().await.remove(id);
    }

    /// Consume inbound messages until the channel closes. Each message gets
    /// its own task; no ordering guarantee between messages.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<InboundMessage>) {
        while let Some(message) = rx.recv().await {
            let dispatcher = self.clone();
            tokio::spawn(async move {
                dispatcher.process_message(message).await;
            });
        }
        tracing::info!("inbound channel closed; dispatcher stopping");
    }

    /// Full pipeline for one message, with the apology terminal state.
    pub async fn process_message(&self, message: InboundMessage) {
        if let Err(error) = self.handle_message(&message).await {
            tracing::error!(
                message_id = %message.id,
                stage = MessageStage::Error.as_str(),
                %error,
                "message pipeline failed"
            );
            // Best effort: a failure to apologize is only logged.
            if let Err(send_error) = self
                .transport
                .send(&message.conversation_id, APOLOGY_TEXT)
                .await
            {
                tracing::error!(
                    message_id = %message.id,
                    error = %send_error,
                    "failed to deliver apology"
                );
            }
        }
    }

    async fn handle_message(&self, message: &InboundMessage) -> Result<()> {
        tracing::trace!(
            message_id = %message.id,
            stage = MessageStage::Received.as_str(),
            sender = %message.sender_address,
        );
        if message
            .sender_address
            .eq_ignore_ascii_case(&self.agent_address)
        {
            tracing::debug!(message_id = %message.id, "dropping self-authored message");
            return Ok(());
        }

        let intent = self.classifier.classify(&message.content);
        tracing::debug!(
            message_id = %message.id,
            stage = MessageStage::Classified.as_str(),
            intent = intent.kind.as_str(),
            confidence = intent.confidence,
        );

        let access = self.verifier.verify_access(&message.sender_address).await;
        tracing::debug!(
            message_id = %message.id,
            stage = MessageStage::Verified.as_str(),
            has_access = access.has_access,
            tier = access.access_tier.as_str(),
        );

        let response = self.composer.compose(&intent, &access);

        self.notify_observers(message, &intent, &access, &response)
            .await;

        match response
            .menu
            .as_ref()
            .and_then(|menu| match serde_json::to_value(menu) {
                Ok(payload) => Some(payload),
                Err(error) => {
                    tracing::warn!(message_id = %message.id, %error, "menu serialization failed");
                    None
                }
            }) {
            Some(payload) => {
                self.send_structured_with_fallback(
                    &message.conversation_id,
                    &response.content,
                    payload,
                    ContentTag::Actions,
                )
                .await?;
            }
            None => {
                self.transport
                    .send(&message.conversation_id, &response.content)
                    .await?;
            }
        }
        tracing::debug!(message_id = %message.id, stage = MessageStage::Sent.as_str());
        Ok(())
    }

    async fn notify_observers(
        &self,
        message: &InboundMessage,
        intent: &Intent,
        access: &AccessResult,
        response: &AgentResponse,
    ) {
        let observers = self.observers.read().await;
        let pending = observers.iter().map(|(id, observer)| {
            let id = id.clone();
            let observer = observer.clone();
            async move { (id, observer.on_response(message, intent, access, response).await) }
        });
        for (id, result) in join_all(pending).await {
            if let Err(error) = result {
                tracing::warn!(observer = %id, %error, "response observer failed");
            }
        }
    }

    /// Structured send, falling back to a plain send of the same text. Only
    /// the fallback's failure propagates.
    async fn send_structured_with_fallback(
        &self,
        conversation_id: &str,
        text: &str,
        payload: serde_json::Value,
        content_tag: ContentTag,
    ) -> std::result::Result<(), TransportError> {
        match self
            .transport
            .send_structured(conversation_id, text, payload, content_tag)
            .await
        {
            Ok(()) => Ok(()),
            Err(error) => {
                tracing::warn!(
                    conversation_id,
                    %content_tag,
                    %error,
                    "structured send failed; falling back to plain text"
                );
                self.transport.send(conversation_id, text).await
            }
        }
    }

    /// Execute a menu action selected by a sender.
    ///
    /// The id is resolved against the global template registry, not a
    /// specific delivered menu. An unknown id is an error to the caller; a
    /// known id with an unrecognized category only logs a warning.
    pub async fn execute_action(&self, action_id: &str, sender_address: &str) -> Result<()> {
        let action = self
            .templates
            .find(action_id)
            .ok_or_else(|| ActionError::NotFound {
                id: action_id.to_string(),
            })?;

        let Some(category) = ActionCategory::detect(&action.id) else {
            tracing::warn!(action_id = %action.id, "action matched no known category; ignoring");
            return Ok(());
        };

        tracing::info!(action_id = %action.id, category = category.as_str(), sender = sender_address);
        match category {
            ActionCategory::Mint => self.handle_mint_action(sender_address).await,
            ActionCategory::Gallery => self.handle_gallery_action(sender_address).await,
            ActionCategory::Community => self.handle_community_action(sender_address).await,
            ActionCategory::Provenance => self.handle_provenance_action(sender_address).await,
            ActionCategory::Concierge => self.handle_concierge_action(sender_address).await,
        }
    }

    /// Prepare a provenance-recording batch for a piece the sender owns.
    pub async fn submit_provenance(
        &self,
        sender_address: &str,
        story: &str,
        token_id: U256,
        collection: Address,
    ) -> Result<()> {
        let access = self.verifier.verify_access(sender_address).await;
        if !access.has_access {
            self.transport
                .send_direct(
                    sender_address,
                    "Provenance records are kept for verified holders. I could not verify \
                     a pass in your wallet.",
                )
                .await?;
            return Ok(());
        }

        let sender = parse_sender(sender_address)?;
        let batch = match self
            .tx_builder
            .build_provenance_transaction(sender, story, token_id, collection)
        {
            Ok(batch) => batch,
            Err(error) => {
                tracing::error!(%error, "provenance build failed");
                self.transport
                    .send_direct(sender_address, APOLOGY_TEXT)
                    .await?;
                return Ok(());
            }
        };

        self.deliver_batch(
            sender_address,
            &batch,
            "Here is the provenance record, ready for your signature.",
        )
        .await?;
        self.best_effort_notify(NotifyEvent::ProvenancePrepared {
            address: sender_address.to_string(),
            token_id: token_id.to_string(),
        })
        .await;
        Ok(())
    }

    async fn handle_mint_action(&self, sender_address: &str) -> Result<()> {
        let access = self.verifier.verify_access(sender_address).await;
        if !access.has_access || access.access_tier <= AccessTier::Basic {
            self.transport
                .send_direct(
                    sender_address,
                    "Minting is open to premium and vip members. Your current holdings \
                     do not reach that tier yet.",
                )
                .await?;
            return Ok(());
        }

        let sender = parse_sender(sender_address)?;
        let batch = match self
            .tx_builder
            .build_mint_transaction(sender, access.access_tier, None)
        {
            Ok(batch) => batch,
            Err(error) => {
                tracing::error!(%error, "mint build failed");
                self.transport
                    .send_direct(sender_address, APOLOGY_TEXT)
                    .await?;
                return Ok(());
            }
        };

        self.deliver_batch(
            sender_address,
            &batch,
            &format!(
                "Your {} mint is ready; sign it in your wallet to complete.",
                access.access_tier
            ),
        )
        .await?;
        self.best_effort_notify(NotifyEvent::MintPrepared {
            address: sender_address.to_string(),
            tier: access.access_tier.as_str().to_string(),
        })
        .await;
        Ok(())
    }

    async fn handle_gallery_action(&self, sender_address: &str) -> Result<()> {
        let access = self.verifier.verify_access(sender_address).await;
        let text = if !access.has_access {
            "The public gallery is always open: curio.gallery/public".to_string()
        } else {
            match access.access_tier {
                AccessTier::Vip => {
                    "Vault gallery unlocked: curio.gallery/vault. Enjoy the rare room."
                        .to_string()
                }
                AccessTier::Premium => {
                    "Members gallery unlocked: curio.gallery/members".to_string()
                }
                AccessTier::Basic => {
                    "Collectors gallery unlocked: curio.gallery/collectors".to_string()
                }
            }
        };
        self.transport.send_direct(sender_address, &text).await?;
        Ok(())
    }

    async fn handle_community_action(&self, sender_address: &str) -> Result<()> {
        let access = self.verifier.verify_access(sender_address).await;
        if access.has_access && access.access_tier >= AccessTier::Premium {
            let sender = parse_sender(sender_address)?;
            let batch = match self.tx_builder.build_community_transaction(
                sender,
                CommunityAction::Stake {
                    amount: U256::from(COMMUNITY_STAKE_WEI),
                },
            ) {
                Ok(batch) => batch,
                Err(error) => {
                    tracing::error!(%error, "community build failed");
                    self.transport
                        .send_direct(sender_address, APOLOGY_TEXT)
                        .await?;
                    return Ok(());
                }
            };
            self.deliver_batch(
                sender_address,
                &batch,
                "Welcome to the inner circle: sign the membership stake to take your seat.",
            )
            .await?;
        } else {
            self.transport
                .send_direct(
                    sender_address,
                    "Welcome to the community! Votes and proposals open up once you hold \
                     a premium pass.",
                )
                .await?;
        }
        self.best_effort_notify(NotifyEvent::CommunityJoined {
            address: sender_address.to_string(),
        })
        .await;
        Ok(())
    }

    async fn handle_provenance_action(&self, sender_address: &str) -> Result<()> {
        self.transport
            .send_direct(
                sender_address,
                "To record provenance, reply with the piece's token id, its collection \
                 address, and the story behind it. I will prepare the record for your \
                 signature.",
            )
            .await?;
        Ok(())
    }

    async fn handle_concierge_action(&self, sender_address: &str) -> Result<()> {
        let access = self.verifier.verify_access(sender_address).await;
        if access.has_access && access.access_tier == AccessTier::Vip {
            self.transport
                .send_direct(
                    sender_address,
                    "Your concierge request is in. A curator will reach out in this \
                     conversation shortly.",
                )
                .await?;
            self.best_effort_notify(NotifyEvent::ConciergeRequested {
                address: sender_address.to_string(),
            })
            .await;
        } else {
            self.transport
                .send_direct(
                    sender_address,
                    "The concierge desk is reserved for vip members.",
                )
                .await?;
        }
        Ok(())
    }

    /// Deliver a wallet-call batch over the sender's direct conversation,
    /// falling back to plain text.
    async fn deliver_batch(
        &self,
        sender_address: &str,
        batch: &TransactionBatch,
        text: &str,
    ) -> Result<()> {
        let payload = serde_json::to_value(batch).map_err(ChainError::from)?;
        self.send_structured_with_fallback(
            sender_address,
            text,
            payload,
            ContentTag::WalletSendCalls,
        )
        .await?;
        Ok(())
    }

    async fn best_effort_notify(&self, event: NotifyEvent) {
        if let Err(error) = self.notifier.notify(event).await {
            tracing::warn!(%error, "side-channel notification failed");
        }
    }
}

fn parse_sender(sender_address: &str) -> std::result::Result<Address, Error> {
    sender_address
        .trim()
        .parse()
        .map_err(|_| Error::Chain(ChainError::InvalidAddress(sender_address.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap as StdHashMap;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;

    use crate::chain::{ChainReader, CollectionMetadata, CollectionRegistry};
    use crate::tx::{MintPrices, TxContracts};

    const SENDER: &str = "0x00000000000000000000000000000000000000aa";
    const AGENT: &str = "0x00000000000000000000000000000000000000a9";

    #[derive(Debug, Clone, PartialEq)]
    enum Sent {
        Plain { conversation_id: String, text: String },
        Structured { conversation_id: String, tag: String },
        Direct { address: String, text: String },
    }

    #[derive(Default)]
    struct FakeTransport {
        sent: StdMutex<Vec<Sent>>,
        fail_structured: bool,
        fail_plain: bool,
    }

    #[async_trait]
    impl MessagingTransport for FakeTransport {
        async fn send(&self, conversation_id: &str, text: &str) -> std::result::Result<(), TransportError> {
            if self.fail_plain {
                return Err(TransportError::SendFailed {
                    conversation_id: conversation_id.to_string(),
                    reason: "simulated".to_string(),
                });
            }
            self.sent.lock().unwrap().push(Sent::Plain {
                conversation_id: conversation_id.to_string(),
                text: text.to_string(),
            });
            Ok(())
        }

        async fn send_structured(
            &self,
            conversation_id: &str,
            _text: &str,
            _payload: serde_json::Value,
            content_tag: ContentTag,
        ) -> std::result::Result<(), TransportError> {
            if self.fail_structured {
                return Err(TransportError::StructuredSendFailed {
                    conversation_id: conversation_id.to_string(),
                    content_tag: content_tag.as_str().to_string(),
                    reason: "simulated".to_string(),
                });
            }
            self.sent.lock().unwrap().push(Sent::Structured {
                conversation_id: conversation_id.to_string(),
                tag: content_tag.as_str().to_string(),
            });
            Ok(())
        }

        async fn send_direct(&self, address: &str, text: &str) -> std::result::Result<(), TransportError> {
            self.sent.lock().unwrap().push(Sent::Direct {
                address: address.to_string(),
                text: text.to_string(),
            });
            Ok(())
        }
    }

    struct FakeChain {
        balances: StdHashMap<Address, u64>,
    }

    #[async_trait]
    impl ChainReader for FakeChain {
        async fn balance_of(
            &self,
            _owner: Address,
            contract: Address,
        ) -> std::result::Result<u64, ChainError> {
            Ok(self.balances.get(&contract).copied().unwrap_or(0))
        }

        async fn token_of_owner_by_index(
            &self,
            _owner: Address,
            _contract: Address,
            index: u64,
        ) -> std::result::Result<alloy_primitives::U256, ChainError> {
            Ok(U256::from(index))
        }

        async fn transaction_succeeded(&self, _tx_hash: &str) -> std::result::Result<bool, ChainError> {
            Ok(true)
        }
    }

    struct FakeRegistry {
        name: String,
    }

    #[async_trait]
    impl CollectionRegistry for FakeRegistry {
        async fn lookup(
            &self,
            _contract: Address,
        ) -> std::result::Result<CollectionMetadata, ChainError> {
            Ok(CollectionMetadata {
                name: self.name.clone(),
                description: String::new(),
            })
        }
    }

    fn dispatcher(
        collection_name: &str,
        balance: u64,
        transport: Arc<FakeTransport>,
    ) -> AgentDispatcher {
        let gated = Address::repeat_byte(0x01);
        let chain = Arc::new(FakeChain {
            balances: StdHashMap::from([(gated, balance)]),
        });
        let verifier = Arc::new(AccessVerifier::new(
            chain.clone(),
            Arc::new(FakeRegistry {
                name: collection_name.to_string(),
            }),
            vec![gated],
        ));
        let tx_builder = Arc::new(TransactionBuilder::new(
            TxContracts {
                provenance: Address::repeat_byte(0x11),
                minting: Address::repeat_byte(0x12),
                community: Address::repeat_byte(0x13),
            },
            MintPrices::default(),
            chain,
        ));
        AgentDispatcher::new(AGENT, verifier, tx_builder, transport)
    }

    fn sent(transport: &FakeTransport) -> Vec<Sent> {
        transport.sent.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn message_flow_sends_structured_actions_menu() {
        let transport = Arc::new(FakeTransport::default());
        let dispatcher = dispatcher("VIP Vault", 1, transport.clone());

        dispatcher
            .process_message(InboundMessage::new("m1", "gm", SENDER, "conv-1"))
            .await;

        let log = sent(&transport);
        assert_eq!(
            log,
            vec![Sent::Structured {
                conversation_id: "conv-1".to_string(),
                tag: "actions".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn self_authored_messages_are_dropped() {
        let transport = Arc::new(FakeTransport::default());
        let dispatcher = dispatcher("VIP Vault", 1, transport.clone());

        dispatcher
            .process_message(InboundMessage::new("m1", "gm", AGENT, "conv-1"))
            .await;

        assert!(sent(&transport).is_empty());
    }

    #[tokio::test]
    async fn structured_failure_falls_back_to_plain_send() {
        let transport = Arc::new(FakeTransport {
            fail_structured: true,
            ..Default::default()
        });
        let dispatcher = dispatcher("VIP Vault", 1, transport.clone());

        dispatcher
            .process_message(InboundMessage::new("m1", "hello", SENDER, "conv-1"))
            .await;

        let log = sent(&transport);
        assert_eq!(log.len(), 1);
        assert!(matches!(&log[0], Sent::Plain { conversation_id, .. } if conversation_id == "conv-1"));
    }

    #[tokio::test]
    async fn unknown_action_id_errors_with_id() {
        let transport = Arc::new(FakeTransport::default());
        let dispatcher = dispatcher("VIP Vault", 1, transport.clone());

        let err = dispatcher
            .execute_action("nonexistent_id", SENDER)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nonexistent_id"));
        assert!(sent(&transport).is_empty());
    }

    #[tokio::test]
    async fn vip_mint_action_delivers_wallet_calls() {
        let transport = Arc::new(FakeTransport::default());
        let dispatcher = dispatcher("Gold Patrons", 2, transport.clone());

        dispatcher.execute_action("mint_nft_vip", SENDER).await.unwrap();

        let log = sent(&transport);
        assert_eq!(
            log,
            vec![Sent::Structured {
                conversation_id: SENDER.to_string(),
                tag: "walletSendCalls".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn basic_holder_is_denied_minting() {
        let transport = Arc::new(FakeTransport::default());
        let dispatcher = dispatcher("Open Edition", 1, transport.clone());

        dispatcher.execute_action("mint_nft_premium", SENDER).await.unwrap();

        let log = sent(&transport);
        assert_eq!(log.len(), 1);
        assert!(
            matches!(&log[0], Sent::Direct { text, .. } if text.contains("premium and vip members"))
        );
    }

    #[tokio::test]
    async fn concierge_is_vip_only() {
        let transport = Arc::new(FakeTransport::default());
        let dispatcher = dispatcher("Silver Circle", 1, transport.clone());

        dispatcher.execute_action("custom_action_vip", SENDER).await.unwrap();

        let log = sent(&transport);
        assert!(matches!(&log[0], Sent::Direct { text, .. } if text.contains("reserved for vip")));
    }

    #[tokio::test]
    async fn provenance_flow_delivers_batch_for_holders() {
        let transport = Arc::new(FakeTransport::default());
        let dispatcher = dispatcher("Silver Circle", 1, transport.clone());

        dispatcher
            .submit_provenance(
                SENDER,
                "won at the spring salon",
                U256::from(7u8),
                Address::repeat_byte(0x01),
            )
            .await
            .unwrap();

        let log = sent(&transport);
        assert_eq!(
            log,
            vec![Sent::Structured {
                conversation_id: SENDER.to_string(),
                tag: "walletSendCalls".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn failing_observer_does_not_block_others_or_reply() {
        struct Failing;
        #[async_trait]
        impl ResponseObserver for Failing {
            async fn on_response(
                &self,
                _message: &InboundMessage,
                _intent: &Intent,
                _access: &AccessResult,
                _response: &AgentResponse,
            ) -> Result<()> {
                Err(Error::Action(ActionError::NotFound {
                    id: "observer".to_string(),
                }))
            }
        }

        struct Counting(Arc<StdMutex<usize>>);
        #[async_trait]
        impl ResponseObserver for Counting {
            async fn on_response(
                &self,
                _message: &InboundMessage,
                _intent: &Intent,
                _access: &AccessResult,
                _response: &AgentResponse,
            ) -> Result<()> {
                *self.0.lock().unwrap() += 1;
                Ok(())
            }
        }

        let transport = Arc::new(FakeTransport::default());
        let dispatcher = dispatcher("VIP Vault", 1, transport.clone());
        let count = Arc::new(StdMutex::new(0));
        dispatcher.register_observer("failing", Arc::new(Failing)).await;
        dispatcher
            .register_observer("counting", Arc::new(Counting(count.clone())))
            .await;

        dispatcher
            .process_message(InboundMessage::new("m1", "gm", SENDER, "conv-1"))
            .await;

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(sent(&transport).len(), 1);
    }

    #[tokio::test]
    async fn pipeline_failure_sends_apology() {
        // Structured and plain sends both fail: the pipeline errors, and the
        // apology itself failing is only logged.
        let transport = Arc::new(FakeTransport {
            fail_structured: true,
            fail_plain: true,
            ..Default::default()
        });
        let dispatcher = dispatcher("VIP Vault", 1, transport.clone());
        dispatcher
            .process_message(InboundMessage::new("m1", "gm", SENDER, "conv-1"))
            .await;
        assert!(sent(&transport).is_empty());
    }
}
