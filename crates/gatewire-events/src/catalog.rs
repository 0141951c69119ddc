//! The gateway event catalogue.
//!
//! Every known dispatch kind, declared once. Variants that specialise another
//! (`ChannelUpdate` of `ChannelCreate`, ...) start from the parent's builder.

use gatewire_protocol::{FieldSpec, FieldType, FieldValue, Schema, models};

use crate::descriptor::{DescriptorBuilder, VariantDescriptor};
use crate::event::DecodedEvent;

/// Wire tags of every catalogued event kind.
pub const KNOWN_TAGS: &[&str] = &[
    "READY",
    "RESUMED",
    "GUILD_CREATE",
    "GUILD_UPDATE",
    "GUILD_DELETE",
    "CHANNEL_CREATE",
    "CHANNEL_UPDATE",
    "CHANNEL_DELETE",
    "CHANNEL_PINS_UPDATE",
    "GUILD_BAN_ADD",
    "GUILD_BAN_REMOVE",
    "GUILD_EMOJIS_UPDATE",
    "GUILD_INTEGRATIONS_UPDATE",
    "GUILD_MEMBERS_CHUNK",
    "GUILD_MEMBER_ADD",
    "GUILD_MEMBER_REMOVE",
    "GUILD_MEMBER_UPDATE",
    "GUILD_ROLE_CREATE",
    "GUILD_ROLE_UPDATE",
    "GUILD_ROLE_DELETE",
    "MESSAGE_CREATE",
    "MESSAGE_UPDATE",
    "MESSAGE_DELETE",
    "MESSAGE_DELETE_BULK",
    "PRESENCE_UPDATE",
    "TYPING_START",
    "VOICE_STATE_UPDATE",
    "VOICE_SERVER_UPDATE",
    "WEBHOOKS_UPDATE",
    "MESSAGE_REACTION_ADD",
    "MESSAGE_REACTION_REMOVE",
    "MESSAGE_REACTION_REMOVE_ALL",
    "MESSAGE_REACTION_REMOVE_EMOJI",
    "USER_UPDATE",
    "PRESENCES_REPLACE",
    "INVITE_CREATE",
    "INVITE_DELETE",
    "INTEGRATION_CREATE",
    "INTEGRATION_UPDATE",
    "INTEGRATION_DELETE",
    "INTERACTION_CREATE",
    "APPLICATION_COMMAND_CREATE",
    "APPLICATION_COMMAND_UPDATE",
    "APPLICATION_COMMAND_DELETE",
    "GUILD_JOIN_REQUEST_DELETE",
    "GIFT_CODE_UPDATE",
    "THREAD_CREATE",
    "THREAD_UPDATE",
    "THREAD_DELETE",
    "THREAD_LIST_SYNC",
    "THREAD_MEMBER_UPDATE",
    "THREAD_MEMBERS_UPDATE",
    "STAGE_INSTANCE_CREATE",
    "STAGE_INSTANCE_UPDATE",
    "STAGE_INSTANCE_DELETE",
    "GUILD_APPLICATION_COMMAND_COUNTS_UPDATE",
    "APPLICATION_COMMAND_PERMISSIONS_UPDATE",
    "GUILD_STICKERS_UPDATE",
    "EMBEDDED_ACTIVITY_UPDATE",
    "GUILD_JOIN_REQUEST_UPDATE",
    "GUILD_SCHEDULED_EVENT_USER_ADD",
    "GUILD_SCHEDULED_EVENT_USER_REMOVE",
    "GUILD_SCHEDULED_EVENT_CREATE",
    "GUILD_SCHEDULED_EVENT_UPDATE",
    "GUILD_SCHEDULED_EVENT_DELETE",
    "GUILD_SCHEDULED_EVENT_EXCEPTIONS_DELETE",
    "GUILD_APPLICATION_COMMAND_INDEX_UPDATE",
    "AUTO_MODERATION_RULE_CREATE",
    "AUTO_MODERATION_RULE_UPDATE",
    "AUTO_MODERATION_RULE_DELETE",
    "AUTO_MODERATION_ACTION_EXECUTION",
    "GUILD_AUDIT_LOG_ENTRY_CREATE",
    "ENTITLEMENT_CREATE",
    "ENTITLEMENT_UPDATE",
    "ENTITLEMENT_DELETE",
    "CHANNEL_TOPIC_UPDATE",
    "VOICE_CHANNEL_STATUS_UPDATE",
    "GUILD_SOUNDBOARD_SOUND_CREATE",
    "GUILD_SOUNDBOARD_SOUND_UPDATE",
    "GUILD_SOUNDBOARD_SOUND_DELETE",
    "GUILD_SOUNDBOARD_SOUNDS_UPDATE",
];

fn snowflake(name: &str) -> FieldSpec {
    FieldSpec::new(name, FieldType::Snowflake)
}

fn text(name: &str) -> FieldSpec {
    FieldSpec::new(name, FieldType::Text)
}

fn int(name: &str) -> FieldSpec {
    FieldSpec::new(name, FieldType::Int)
}

fn model(name: &str, schema: fn() -> &'static Schema) -> FieldSpec {
    FieldSpec::new(name, FieldType::model(schema))
}

fn list_of(name: &str, schema: fn() -> &'static Schema) -> FieldSpec {
    FieldSpec::new(name, FieldType::list_of(schema))
}

fn list(name: &str, item: FieldType) -> FieldSpec {
    FieldSpec::new(name, FieldType::list(item))
}

fn variant(name: &str) -> DescriptorBuilder {
    VariantDescriptor::builder(name)
}

/// `name` with a single `guild_id` field, the shape of many guild-scoped events.
fn guild_scoped(name: &str) -> DescriptorBuilder {
    variant(name).field(snowflake("guild_id"))
}

// ─── Derived attributes ────────────────────────────────────────────

/// True for a real join; false when a guild comes back from an outage.
fn guild_created(event: &DecodedEvent) -> FieldValue {
    FieldValue::Bool(event.proxied("unavailable").is_ok_and(FieldValue::is_null))
}

/// True when the guild was left; false when it only became unavailable.
///
/// Read from the raw body: the decoded `unavailable` defaults to false and
/// cannot tell an absent key from an explicit `false`.
fn guild_deleted(event: &DecodedEvent) -> FieldValue {
    FieldValue::Bool(
        event
            .raw()
            .get("unavailable")
            .is_none_or(serde_json::Value::is_null),
    )
}

fn channel_overwrites(event: &DecodedEvent) -> FieldValue {
    event
        .proxied("permission_overwrites")
        .cloned()
        .unwrap_or(FieldValue::Null)
}

// ─── Variants ──────────────────────────────────────────────────────

fn ready() -> DescriptorBuilder {
    variant("Ready")
        .field(int("version").with_alias("v"))
        .field(model("user", models::user))
        .field(list_of("guilds", models::guild))
        .field(text("session_id"))
        .field(text("resume_gateway_url"))
        .field(list("shard", FieldType::Int))
        .field(model("application", models::application))
        .field(list("geo_ordered_rtc_regions", FieldType::Text))
        .field(list_of("presences", models::presence))
        .field(list_of("private_channels", models::channel))
        .field(list_of("relationships", models::user))
        .field(text("session_type"))
        .field(list("trace", FieldType::Text).with_alias("_trace"))
        .field(list("current_location", FieldType::Text))
}

fn channel_create() -> DescriptorBuilder {
    variant("ChannelCreate").embed(models::channel)
}

fn guild_ban_add() -> DescriptorBuilder {
    variant("GuildBanAdd")
        .field(snowflake("guild_id"))
        .field(model("user", models::user))
        .proxy("user")
}

fn guild_role_create() -> DescriptorBuilder {
    variant("GuildRoleCreate")
        .field(model("role", models::role))
        .field(snowflake("guild_id"))
        .proxy("role")
        .attach("guild_id", "role", "guild_id")
}

fn message_reaction(name: &str) -> DescriptorBuilder {
    variant(name)
        .field(snowflake("guild_id"))
        .field(snowflake("channel_id"))
        .field(snowflake("message_id"))
}

fn scheduled_event_user(name: &str) -> DescriptorBuilder {
    guild_scoped(name)
        .field(snowflake("guild_scheduled_event_id"))
        .field(snowflake("user_id"))
}

/// Builders for every catalogued variant, in declaration order.
pub fn standard_variants() -> Vec<DescriptorBuilder> {
    vec![
        ready(),
        variant("Resumed").field(list("trace", FieldType::Text).with_alias("_trace")),
        // Guilds
        variant("GuildCreate")
            .embed(models::guild)
            .field(list_of("presences", models::presence))
            .derived("created", guild_created),
        variant("GuildUpdate").embed(models::guild),
        variant("GuildDelete")
            .field(snowflake("id"))
            .field(
                FieldSpec::new("unavailable", FieldType::Bool).with_default(FieldValue::Bool(false)),
            )
            .derived("deleted", guild_deleted),
        // Channels
        channel_create(),
        channel_create()
            .renamed("ChannelUpdate")
            .derived("overwrites", channel_overwrites),
        channel_create().renamed("ChannelDelete"),
        guild_scoped("ChannelPinsUpdate")
            .field(snowflake("channel_id"))
            .field(FieldSpec::new("last_pin_timestamp", FieldType::Timestamp)),
        // Bans, emojis, members, roles
        guild_ban_add(),
        guild_ban_add().renamed("GuildBanRemove"),
        guild_scoped("GuildEmojisUpdate").field(list_of("emojis", models::guild_emoji)),
        guild_scoped("GuildIntegrationsUpdate"),
        guild_scoped("GuildMembersChunk")
            .field(list_of("members", models::guild_member))
            .field(int("chunk_index"))
            .field(int("chunk_count"))
            .field(list("not_found", FieldType::Snowflake))
            .field(list_of("presences", models::presence))
            .field(FieldSpec::new("nonce", FieldType::StrOrInt)),
        variant("GuildMemberAdd").embed_as(models::guild_member, "member"),
        variant("GuildMemberRemove")
            .field(model("user", models::user))
            .field(snowflake("guild_id"))
            .proxy("user"),
        variant("GuildMemberUpdate").embed_as(models::guild_member, "member"),
        guild_role_create(),
        guild_role_create().renamed("GuildRoleUpdate"),
        guild_scoped("GuildRoleDelete").field(snowflake("role_id")),
        // Messages
        variant("MessageCreate")
            .embed(models::message)
            .attach("author", "member", "user")
            .attach("guild_id", "member", "guild_id"),
        variant("MessageUpdate").embed(models::message),
        variant("MessageDelete")
            .field(snowflake("id"))
            .field(snowflake("channel_id"))
            .field(snowflake("guild_id")),
        guild_scoped("MessageDeleteBulk")
            .field(snowflake("channel_id"))
            .field(list("ids", FieldType::Snowflake)),
        // Presence, typing, voice, webhooks
        variant("PresenceUpdate").embed(models::presence),
        guild_scoped("TypingStart")
            .field(snowflake("channel_id"))
            .field(snowflake("user_id"))
            .field(int("timestamp"))
            .field(model("member", models::guild_member)),
        variant("VoiceStateUpdate")
            .embed_as(models::guild_voice_state, "state")
            .attach("member", "state", "member"),
        guild_scoped("VoiceServerUpdate")
            .field(text("token"))
            .field(text("endpoint")),
        guild_scoped("WebhooksUpdate").field(snowflake("channel_id")),
        // Reactions
        message_reaction("MessageReactionAdd")
            .field(snowflake("user_id"))
            .field(model("emoji", models::emoji))
            .field(model("member", models::guild_member))
            .field(snowflake("message_author_id")),
        message_reaction("MessageReactionRemove")
            .field(snowflake("user_id"))
            .field(model("emoji", models::emoji)),
        message_reaction("MessageReactionRemoveAll"),
        message_reaction("MessageReactionRemoveEmoji").field(model("emoji", models::emoji)),
        // Users
        variant("UserUpdate").embed(models::user),
        variant("PresencesReplace"),
        // Invites, integrations, interactions, commands
        variant("InviteCreate").embed(models::invite),
        variant("InviteDelete").embed(models::invite),
        guild_scoped("IntegrationCreate").embed(models::integration),
        guild_scoped("IntegrationUpdate").embed(models::integration),
        guild_scoped("IntegrationDelete").embed(models::integration),
        variant("InteractionCreate")
            .embed(models::interaction)
            .field(FieldSpec::new("app_permissions", FieldType::Permissions))
            .field(model("channel", models::channel))
            .field(list("entitlement_sku_ids", FieldType::Snowflake))
            .field(list_of("entitlements", models::guild_entitlement))
            .field(model("guild", models::guild))
            .field(list_of("recipients", models::user))
            .attach("guild_id", "member", "guild_id"),
        variant("ApplicationCommandCreate").embed(models::application_command),
        variant("ApplicationCommandUpdate").embed(models::application_command),
        variant("ApplicationCommandDelete").embed(models::application_command),
        guild_scoped("GuildJoinRequestDelete").field(snowflake("user_id")),
        guild_scoped("GiftCodeUpdate")
            .field(snowflake("channel_id"))
            .field(text("code"))
            .field(snowflake("sku_id"))
            .field(int("uses")),
        // Threads and stages
        variant("ThreadCreate").embed(models::thread),
        variant("ThreadUpdate").embed(models::thread),
        variant("ThreadDelete").embed(models::thread),
        guild_scoped("ThreadListSync")
            .field(list("channel_ids", FieldType::Snowflake))
            .field(list_of("threads", models::thread))
            .field(list_of("members", models::thread_member)),
        variant("ThreadMemberUpdate").embed(models::thread_member),
        guild_scoped("ThreadMembersUpdate")
            .field(snowflake("id"))
            .field(int("member_count"))
            .field(list_of("added_members", models::thread_member))
            .field(list("removed_member_ids", FieldType::Snowflake)),
        variant("StageInstanceCreate")
            .embed(models::stage_instance)
            .field(text("invite_code")),
        variant("StageInstanceUpdate")
            .embed(models::stage_instance)
            .field(text("invite_code")),
        variant("StageInstanceDelete").embed(models::stage_instance),
        guild_scoped("GuildApplicationCommandCountsUpdate")
            .field(FieldSpec::new("application_command_counts", FieldType::Json)),
        variant("ApplicationCommandPermissionsUpdate")
            .embed(models::application_command_permissions),
        guild_scoped("GuildStickersUpdate").field(list_of("stickers", models::sticker)),
        guild_scoped("EmbeddedActivityUpdate"),
        guild_scoped("GuildJoinRequestUpdate"),
        // Scheduled events
        scheduled_event_user("GuildScheduledEventUserAdd"),
        scheduled_event_user("GuildScheduledEventUserRemove"),
        variant("GuildScheduledEventCreate").embed(models::guild_scheduled_event),
        variant("GuildScheduledEventUpdate").embed(models::guild_scheduled_event),
        variant("GuildScheduledEventDelete").embed(models::guild_scheduled_event),
        guild_scoped("GuildScheduledEventExceptionsDelete").field(snowflake("event_id")),
        guild_scoped("GuildApplicationCommandIndexUpdate"),
        // Moderation and audit
        variant("AutoModerationRuleCreate").embed(models::auto_moderation_rule),
        variant("AutoModerationRuleUpdate").embed(models::auto_moderation_rule),
        variant("AutoModerationRuleDelete").embed(models::auto_moderation_rule),
        variant("AutoModerationActionExecution").embed(models::auto_moderation_action_execute),
        variant("GuildAuditLogEntryCreate").embed(models::audit_log_entry),
        // Monetization
        variant("EntitlementCreate").embed(models::guild_entitlement),
        variant("EntitlementUpdate").embed(models::guild_entitlement),
        variant("EntitlementDelete").embed(models::guild_entitlement),
        // Channel status
        variant("ChannelTopicUpdate").embed(models::channel),
        variant("VoiceChannelStatusUpdate").embed(models::channel),
        // Soundboard
        variant("GuildSoundboardSoundCreate").embed(models::guild_soundboard_sound),
        variant("GuildSoundboardSoundUpdate").embed(models::guild_soundboard_sound),
        variant("GuildSoundboardSoundDelete").embed(models::guild_soundboard_sound),
        guild_scoped("GuildSoundboardSoundsUpdate")
            .field(list_of("soundboard_sounds", models::guild_soundboard_sound)),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use anyhow::Result;
    use gatewire_protocol::Snowflake;
    use serde_json::{Value, json};

    use super::*;
    use crate::dispatch::{DecodeError, Dispatcher};
    use crate::event::DispatchContext;
    use crate::naming::tag_of;
    use crate::registry::{EventRegistry, RegistryBuilder, RegistryError};

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(EventRegistry::standard().unwrap()))
    }

    fn decode(tag: &str, body: Value) -> DecodedEvent {
        dispatcher()
            .decode(tag, body, Arc::new(DispatchContext::default()))
            .unwrap()
    }

    #[test]
    fn every_variant_round_trips_through_its_tag() {
        let registry = EventRegistry::standard().unwrap();
        assert_eq!(registry.len(), 81);
        for descriptor in registry.descriptors() {
            let tag = tag_of(descriptor.name());
            let found = registry.lookup(&tag).unwrap();
            assert!(Arc::ptr_eq(found, descriptor), "{tag} resolved elsewhere");
        }
    }

    #[test]
    fn computed_tags_match_the_wire_set() {
        let registry = EventRegistry::standard().unwrap();
        let computed: BTreeSet<&str> = registry.tags().into_iter().collect();
        let known: BTreeSet<&str> = KNOWN_TAGS.iter().copied().collect();
        assert_eq!(KNOWN_TAGS.len(), known.len());
        assert_eq!(computed, known);
    }

    #[test]
    fn duplicate_declaration_fails_the_build() {
        let mut builder = RegistryBuilder::new();
        let mut result = Ok(());
        for declared in standard_variants().into_iter().chain([variant("Guild_Update")]) {
            if let Err(err) = builder.declare(declared) {
                result = Err(err);
                break;
            }
        }
        assert!(matches!(
            result,
            Err(RegistryError::DuplicateTagRegistration { tag, .. }) if tag == "GUILD_UPDATE"
        ));
    }

    #[test]
    fn message_create_embeds_and_proxies_the_message() -> Result<()> {
        let event = decode(
            "MESSAGE_CREATE",
            json!({"id": "123", "channel_id": "456", "content": "hi", "author": {"id": "9"}}),
        );
        assert_eq!(event.get_path("message.content")?.as_str(), Some("hi"));
        assert_eq!(
            event.get_path("message.author.id")?.as_snowflake(),
            Some(Snowflake::new(9))
        );
        assert_eq!(event.get("content")?.as_str(), Some("hi"));
        assert_eq!(event.get("channel_id")?.as_snowflake(), Some(Snowflake::new(456)));
        Ok(())
    }

    #[test]
    fn message_create_attaches_author_and_guild_to_member() -> Result<()> {
        let event = decode(
            "MESSAGE_CREATE",
            json!({
                "id": "1",
                "guild_id": "77",
                "author": {"id": "9", "username": "ada"},
                "member": {"nick": "Ada", "roles": []}
            }),
        );
        assert_eq!(event.attach_report().applied, 2);
        assert_eq!(event.get_path("member.user.username")?.as_str(), Some("ada"));
        assert_eq!(
            event.get_path("member.guild_id")?.as_snowflake(),
            Some(Snowflake::new(77))
        );
        Ok(())
    }

    #[test]
    fn message_create_without_member_skips_attach() {
        let event = decode("MESSAGE_CREATE", json!({"id": "1", "author": {"id": "9"}}));
        assert_eq!(event.attach_report().applied, 0);
        assert_eq!(event.attach_report().skipped, 2);
    }

    #[test]
    fn guild_role_create_attaches_guild_id() -> Result<()> {
        let event = decode(
            "GUILD_ROLE_CREATE",
            json!({"guild_id": "1", "role": {"id": "2", "name": "x"}}),
        );
        assert_eq!(
            event.get_path("role.guild_id")?.as_snowflake(),
            Some(Snowflake::new(1))
        );
        assert_eq!(event.get("name")?.as_str(), Some("x"));

        let update = decode(
            "GUILD_ROLE_UPDATE",
            json!({"guild_id": "1", "role": {"id": "2"}}),
        );
        assert_eq!(update.name(), "GuildRoleUpdate");
        assert_eq!(update.attach_report().applied, 1);
        Ok(())
    }

    #[test]
    fn unknown_tag_leaves_the_registry_alone() {
        let dispatcher = dispatcher();
        let err = dispatcher
            .decode(
                "NOT_A_REAL_EVENT",
                json!({"id": "1"}),
                Arc::new(DispatchContext::default()),
            )
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnknownEventKind(tag) if tag == "NOT_A_REAL_EVENT"));
        assert_eq!(dispatcher.registry().len(), 81);
    }

    #[test]
    fn embed_splits_keys_between_alias_and_own_fields() -> Result<()> {
        let event = decode(
            "STAGE_INSTANCE_CREATE",
            json!({"id": "5", "topic": "town hall", "invite_code": "abc", "unknown": 1}),
        );
        let stage = event.field("stageinstance")?.as_model().unwrap();
        let present: Vec<&str> = stage.fields().map(|(name, _)| name).collect();
        assert_eq!(present, vec!["id", "topic"]);
        assert_eq!(event.field("invite_code")?.as_str(), Some("abc"));
        assert!(event.get("unknown").is_err());
        Ok(())
    }

    #[test]
    fn multi_word_schemas_embed_under_their_lowercased_name() -> Result<()> {
        let cases = [
            ("STAGE_INSTANCE_CREATE", "stageinstance", "id"),
            ("APPLICATION_COMMAND_CREATE", "applicationcommand", "id"),
            ("GUILD_SCHEDULED_EVENT_UPDATE", "guildscheduledevent", "id"),
            ("ENTITLEMENT_CREATE", "guildentitlement", "id"),
            ("GUILD_SOUNDBOARD_SOUND_DELETE", "guildsoundboardsound", "sound_id"),
            ("THREAD_MEMBER_UPDATE", "threadmember", "id"),
            ("GUILD_AUDIT_LOG_ENTRY_CREATE", "auditlogentry", "id"),
            ("AUTO_MODERATION_RULE_CREATE", "automoderationrule", "id"),
        ];
        for (tag, alias, key) in cases {
            let event = decode(tag, json!({ key: "5" }));
            assert_eq!(event.descriptor().proxy(), Some(alias), "{tag}");
            assert_eq!(
                event.get_path(&format!("{alias}.{key}"))?.as_snowflake(),
                Some(Snowflake::new(5)),
                "{tag}"
            );
        }
        Ok(())
    }

    #[test]
    fn embedded_value_satisfies_the_schema_contract() -> Result<()> {
        let event = decode("USER_UPDATE", json!({"id": "3", "username": "grace"}));
        let user = event.field("user")?.as_model().unwrap();
        assert!(std::ptr::eq(user.schema(), models::user()));
        assert_eq!(user.get("bot"), Some(&FieldValue::Bool(false)));
        Ok(())
    }

    #[test]
    fn guild_create_and_delete_derived_flags() -> Result<()> {
        let joined = decode("GUILD_CREATE", json!({"id": "1", "name": "g"}));
        assert_eq!(joined.get("created")?.as_bool(), Some(true));
        assert_eq!(joined.get("name")?.as_str(), Some("g"));

        let recovered = decode("GUILD_CREATE", json!({"id": "1", "unavailable": false}));
        assert_eq!(recovered.get("created")?.as_bool(), Some(false));

        let left = decode("GUILD_DELETE", json!({"id": "1"}));
        assert_eq!(left.get("deleted")?.as_bool(), Some(true));
        let outage = decode("GUILD_DELETE", json!({"id": "1", "unavailable": true}));
        assert_eq!(outage.get("deleted")?.as_bool(), Some(false));
        let explicit = decode("GUILD_DELETE", json!({"id": "1", "unavailable": false}));
        assert_eq!(explicit.get("deleted")?.as_bool(), Some(false));
        assert_eq!(explicit.get("unavailable")?.as_bool(), Some(false));
        Ok(())
    }

    #[test]
    fn ban_events_proxy_the_user() -> Result<()> {
        for tag in ["GUILD_BAN_ADD", "GUILD_BAN_REMOVE", "GUILD_MEMBER_REMOVE"] {
            let event = decode(tag, json!({"guild_id": "1", "user": {"id": "4", "username": "eve"}}));
            assert_eq!(event.get("username")?.as_str(), Some("eve"), "{tag}");
            assert_eq!(event.get("guild_id")?.as_snowflake(), Some(Snowflake::new(1)));
        }
        Ok(())
    }

    #[test]
    fn voice_state_update_attaches_member_to_state() -> Result<()> {
        let event = decode(
            "VOICE_STATE_UPDATE",
            json!({
                "guild_id": "1",
                "channel_id": "2",
                "user_id": "3",
                "session_id": "abc",
                "member": {"user": {"id": "3"}}
            }),
        );
        assert_eq!(event.get("session_id")?.as_str(), Some("abc"));
        assert_eq!(
            event.get_path("state.member.user.id")?.as_snowflake(),
            Some(Snowflake::new(3))
        );
        assert_eq!(event.attach_report().applied, 1);
        Ok(())
    }

    #[test]
    fn interaction_create_keeps_own_fields_and_attaches_guild() -> Result<()> {
        let event = decode(
            "INTERACTION_CREATE",
            json!({
                "id": "1",
                "type": 2,
                "guild_id": "50",
                "member": {"user": {"id": "8"}},
                "app_permissions": "2048",
                "entitlement_sku_ids": ["99"]
            }),
        );
        assert_eq!(event.field("app_permissions")?.as_i64(), Some(2048));
        assert_eq!(
            event.get_path("interaction.member.guild_id")?.as_snowflake(),
            Some(Snowflake::new(50))
        );
        assert_eq!(
            event.get_path("entitlement_sku_ids.0")?.as_snowflake(),
            Some(Snowflake::new(99))
        );
        Ok(())
    }

    #[test]
    fn channel_update_exposes_overwrites() -> Result<()> {
        let event = decode(
            "CHANNEL_UPDATE",
            json!({
                "id": "1",
                "permission_overwrites": [{"id": "7", "type": 0, "allow": "1024", "deny": "0"}]
            }),
        );
        let overwrites = event.get("overwrites")?;
        let entry = overwrites.as_map().and_then(|m| m.get("7")).unwrap();
        assert_eq!(entry.lookup("allow").and_then(FieldValue::as_i64), Some(1024));
        Ok(())
    }

    #[test]
    fn ready_reads_aliased_fields() -> Result<()> {
        let event = decode(
            "READY",
            json!({
                "v": 10,
                "user": {"id": "1", "username": "bot", "bot": true},
                "guilds": [{"id": "2", "unavailable": true}],
                "session_id": "s1",
                "shard": [0, 1],
                "_trace": ["gateway-prd"]
            }),
        );
        assert_eq!(event.get("version")?.as_i64(), Some(10));
        assert_eq!(event.get_path("user.bot")?.as_bool(), Some(true));
        assert_eq!(event.get_path("trace.0")?.as_str(), Some("gateway-prd"));
        assert_eq!(event.get_path("guilds.0.unavailable")?.as_bool(), Some(true));
        Ok(())
    }

    #[test]
    fn array_bodies_decode_without_fields() {
        let event = decode("PRESENCES_REPLACE", json!([{"status": "online"}]));
        assert_eq!(event.fields().count(), 0);
        assert!(event.raw().is_array());
    }

    #[test]
    fn json_fields_keep_the_wire_value() -> Result<()> {
        let counts = json!({"1": 4, "2": 1, "3": 0});
        let event = decode(
            "GUILD_APPLICATION_COMMAND_COUNTS_UPDATE",
            json!({"guild_id": "1", "application_command_counts": counts.clone()}),
        );
        assert_eq!(event.field("application_command_counts")?.as_json(), Some(&counts));
        assert_eq!(event.field("guild_id")?.as_json(), None);
        Ok(())
    }
}
