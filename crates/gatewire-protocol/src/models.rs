//! Domain schemas for objects carried inside gateway dispatches.
//!
//! Each accessor returns a `'static` [`Schema`] built on first use. Schemas
//! reference each other through accessors, so recursive shapes (a message
//! quoting another message) need no special handling.

use std::sync::LazyLock;

use crate::schema::{FieldSpec, FieldType, Schema};
use crate::value::FieldValue;

macro_rules! schema {
    ($(#[$meta:meta])* $accessor:ident => $name:literal { $($field:expr),* $(,)? }) => {
        $(#[$meta])*
        pub fn $accessor() -> &'static Schema {
            static SCHEMA: LazyLock<Schema> = LazyLock::new(|| Schema::new($name, [$($field),*]));
            &SCHEMA
        }
    };
}

fn field(name: &str, ty: FieldType) -> FieldSpec {
    FieldSpec::new(name, ty)
}

fn flag(name: &str, default: bool) -> FieldSpec {
    FieldSpec::new(name, FieldType::Bool).with_default(FieldValue::Bool(default))
}

fn id(name: &str) -> FieldSpec {
    FieldSpec::new(name, FieldType::Snowflake)
}

fn text(name: &str) -> FieldSpec {
    FieldSpec::new(name, FieldType::Text)
}

fn int(name: &str) -> FieldSpec {
    FieldSpec::new(name, FieldType::Int)
}

fn boolean(name: &str) -> FieldSpec {
    FieldSpec::new(name, FieldType::Bool)
}

fn timestamp(name: &str) -> FieldSpec {
    FieldSpec::new(name, FieldType::Timestamp)
}

fn ids(name: &str) -> FieldSpec {
    FieldSpec::new(name, FieldType::list(FieldType::Snowflake))
}

fn json(name: &str) -> FieldSpec {
    FieldSpec::new(name, FieldType::Json)
}

// ─── Users & presence ──────────────────────────────────────────────

schema!(
    /// A platform account.
    user => "User" {
        id("id"),
        text("username"),
        text("discriminator"),
        text("global_name"),
        text("avatar"),
        flag("bot", false),
        flag("system", false),
        boolean("mfa_enabled"),
        text("banner"),
        field("accent_color", FieldType::StrOrInt),
        text("locale"),
        boolean("verified"),
        text("email"),
        int("flags"),
        int("premium_type"),
        int("public_flags"),
        text("avatar_decoration"),
        text("display_name"),
    }
);

schema!(activity_timestamps => "ActivityTimestamps" { int("start"), int("end") });

schema!(activity_assets => "ActivityAssets" {
    text("large_image"),
    text("large_text"),
    text("small_image"),
    text("small_text"),
});

schema!(activity => "Activity" {
    text("name"),
    int("type"),
    text("url"),
    field("timestamps", FieldType::model(activity_timestamps)),
    text("application_id"),
    text("details"),
    text("state"),
    json("party"),
    field("assets", FieldType::model(activity_assets)),
    json("secrets"),
    boolean("instance"),
    int("flags"),
});

schema!(client_status => "ClientStatus" { text("desktop"), text("mobile"), text("web") });

schema!(
    /// A user's online status and activities within a guild.
    presence => "Presence" {
        field("user", FieldType::model(user)),
        id("guild_id"),
        text("status"),
        field("activities", FieldType::list_of(activity)),
        field("client_status", FieldType::model(client_status)),
        text("broadcast"),
    }
);

// ─── Guild structure ───────────────────────────────────────────────

schema!(role => "Role" {
    id("id"),
    id("guild_id"),
    text("name"),
    boolean("hoist"),
    boolean("managed"),
    int("color"),
    field("permissions", FieldType::Permissions),
    int("position"),
    boolean("mentionable"),
    field("tags", FieldType::dict(FieldType::Json)),
});

schema!(emoji => "Emoji" { id("id"), text("name"), boolean("animated") });

schema!(guild_emoji => "GuildEmoji" {
    id("id"),
    text("name"),
    ids("roles"),
    field("user", FieldType::model(user)),
    boolean("require_colons"),
    boolean("managed"),
    boolean("animated"),
    boolean("available"),
    id("guild_id"),
});

schema!(sticker => "Sticker" {
    id("id"),
    id("pack_id"),
    text("name"),
    text("description"),
    text("tags"),
    int("type"),
    int("format_type"),
    boolean("available"),
    id("guild_id"),
    field("user", FieldType::model(user)),
    int("sort_value"),
});

schema!(
    /// Guild membership of a user.
    guild_member => "GuildMember" {
        field("user", FieldType::model(user)),
        FieldSpec::new("nick", FieldType::Text).with_default(FieldValue::Null),
        text("avatar"),
        ids("roles"),
        timestamp("joined_at"),
        timestamp("premium_since"),
        boolean("deaf"),
        boolean("mute"),
        flag("pending", false),
        text("permissions"),
        timestamp("communication_disabled_until"),
        int("flags"),
        id("guild_id"),
    }
);

schema!(guild_voice_state => "GuildVoiceState" {
    id("guild_id"),
    id("channel_id"),
    id("user_id"),
    field("member", FieldType::model(guild_member)),
    text("session_id"),
    boolean("deaf"),
    boolean("mute"),
    boolean("self_deaf"),
    boolean("self_mute"),
    boolean("self_stream"),
    boolean("self_video"),
    boolean("suppress"),
    timestamp("request_to_speak_timestamp"),
});

schema!(
    /// A guild (server). Roles, emojis and channels are keyed by id.
    guild => "Guild" {
        id("id"),
        text("name"),
        text("icon"),
        text("splash"),
        text("discovery_splash"),
        boolean("owner"),
        id("owner_id"),
        field("permissions", FieldType::Permissions),
        text("region"),
        id("afk_channel_id"),
        int("afk_timeout"),
        int("verification_level"),
        int("default_message_notifications"),
        int("explicit_content_filter"),
        field("roles", FieldType::auto_dict(role, "id")),
        field("emojis", FieldType::auto_dict(guild_emoji, "id")),
        field("features", FieldType::list(FieldType::Text)),
        int("mfa_level"),
        id("application_id"),
        boolean("widget_enabled"),
        id("widget_channel_id"),
        id("system_channel_id"),
        int("system_channel_flags"),
        id("rules_channel_id"),
        timestamp("joined_at"),
        boolean("large"),
        boolean("unavailable"),
        int("member_count"),
        field("voice_states", FieldType::list_of(guild_voice_state)),
        field("members", FieldType::list_of(guild_member)),
        field("channels", FieldType::auto_dict(channel, "id")),
        field("threads", FieldType::auto_dict(thread, "id")),
        FieldSpec::new("max_presences", FieldType::Int).with_default(FieldValue::Null),
        int("max_members"),
        text("vanity_url_code"),
        text("description"),
        text("banner"),
        int("premium_tier"),
        FieldSpec::new("premium_subscription_count", FieldType::Int)
            .with_default(FieldValue::Int(0)),
        text("preferred_locale"),
        id("public_updates_channel_id"),
        int("max_video_channel_users"),
        int("approximate_member_count"),
        int("approximate_presence_count"),
        boolean("nsfw"),
        field("stickers", FieldType::list_of(sticker)),
    }
);

// ─── Channels & threads ────────────────────────────────────────────

schema!(permission_overwrite => "PermissionOverwrite" {
    id("id"),
    int("type"),
    field("allow", FieldType::Permissions),
    field("deny", FieldType::Permissions),
});

schema!(thread_metadata => "ThreadMetadata" {
    boolean("archived"),
    int("auto_archive_duration"),
    timestamp("archive_timestamp"),
    boolean("locked"),
    boolean("invitable"),
    timestamp("create_timestamp"),
});

schema!(
    /// Any guild, DM or group channel.
    channel => "Channel" {
        id("id"),
        id("guild_id"),
        int("type"),
        int("position"),
        field(
            "permission_overwrites",
            FieldType::auto_dict(permission_overwrite, "id"),
        ),
        text("name"),
        text("topic"),
        text("status"),
        boolean("nsfw"),
        id("last_message_id"),
        int("bitrate"),
        int("user_limit"),
        int("rate_limit_per_user"),
        field("recipients", FieldType::list_of(user)),
        text("icon"),
        id("owner_id"),
        id("application_id"),
        id("parent_id"),
        timestamp("last_pin_timestamp"),
        text("rtc_region"),
        int("video_quality_mode"),
        int("flags"),
    }
);

schema!(thread_member => "ThreadMember" {
    id("id"),
    id("user_id"),
    id("guild_id"),
    timestamp("join_timestamp"),
    int("flags"),
    field("member", FieldType::model(guild_member)),
});

schema!(
    /// A thread channel with its thread-only attributes.
    thread => "Thread" {
        id("id"),
        id("guild_id"),
        id("parent_id"),
        id("owner_id"),
        int("type"),
        text("name"),
        id("last_message_id"),
        int("rate_limit_per_user"),
        int("message_count"),
        int("member_count"),
        field("thread_metadata", FieldType::model(thread_metadata)),
        field("member", FieldType::model(thread_member)),
        int("flags"),
        boolean("newly_created"),
        ids("applied_tags"),
    }
);

schema!(stage_instance => "StageInstance" {
    id("id"),
    id("guild_id"),
    id("channel_id"),
    text("topic"),
    int("privacy_level"),
    boolean("discoverable_disabled"),
    id("guild_scheduled_event_id"),
});

// ─── Messages ──────────────────────────────────────────────────────

schema!(attachment => "Attachment" {
    id("id"),
    text("filename"),
    text("description"),
    text("content_type"),
    int("size"),
    text("url"),
    text("proxy_url"),
    int("height"),
    int("width"),
    boolean("ephemeral"),
});

schema!(
    /// A channel message. `referenced_message` nests another message.
    message => "Message" {
        id("id"),
        id("channel_id"),
        id("guild_id"),
        field("author", FieldType::model(user)),
        field("member", FieldType::model(guild_member)),
        text("content"),
        timestamp("timestamp"),
        timestamp("edited_timestamp"),
        flag("tts", false),
        flag("mention_everyone", false),
        field("mentions", FieldType::list_of(user)),
        ids("mention_roles"),
        field("attachments", FieldType::list_of(attachment)),
        field("embeds", FieldType::list(FieldType::Json)),
        field("reactions", FieldType::list(FieldType::Json)),
        field("nonce", FieldType::StrOrInt),
        flag("pinned", false),
        id("webhook_id"),
        int("type"),
        id("application_id"),
        json("message_reference"),
        int("flags"),
        field("referenced_message", FieldType::model(message)),
        field("thread", FieldType::model(thread)),
        field("sticker_items", FieldType::list(FieldType::Json)),
    }
);

// ─── Invites, integrations, applications ───────────────────────────

schema!(application => "Application" {
    id("id"),
    text("name"),
    text("icon"),
    text("description"),
    boolean("bot_public"),
    boolean("bot_require_code_grant"),
    field("owner", FieldType::model(user)),
    text("verify_key"),
    id("guild_id"),
    int("flags"),
});

schema!(guild_scheduled_event => "GuildScheduledEvent" {
    id("id"),
    id("guild_id"),
    id("channel_id"),
    id("creator_id"),
    text("name"),
    text("description"),
    timestamp("scheduled_start_time"),
    timestamp("scheduled_end_time"),
    int("privacy_level"),
    int("status"),
    int("entity_type"),
    id("entity_id"),
    json("entity_metadata"),
    field("creator", FieldType::model(user)),
    int("user_count"),
    text("image"),
});

schema!(invite => "Invite" {
    text("code"),
    id("guild_id"),
    id("channel_id"),
    field("guild", FieldType::model(guild)),
    field("channel", FieldType::model(channel)),
    field("inviter", FieldType::model(user)),
    int("target_type"),
    field("target_user", FieldType::model(user)),
    field("target_application", FieldType::model(application)),
    int("approximate_presence_count"),
    int("approximate_member_count"),
    timestamp("expires_at"),
    field("stage_instance", FieldType::model(stage_instance)),
    field("guild_scheduled_event", FieldType::model(guild_scheduled_event)),
    int("uses"),
    int("max_uses"),
    int("max_age"),
    boolean("temporary"),
    timestamp("created_at"),
});

schema!(integration_account => "IntegrationAccount" { text("id"), text("name") });

schema!(integration => "Integration" {
    id("id"),
    text("name"),
    text("type"),
    boolean("enabled"),
    boolean("syncing"),
    id("role_id"),
    boolean("enable_emoticons"),
    int("expire_behavior"),
    int("expire_grace_period"),
    field("user", FieldType::model(user)),
    field("account", FieldType::model(integration_account)),
    timestamp("synced_at"),
    int("subscriber_count"),
    boolean("revoked"),
    field("application", FieldType::model(application)),
});

schema!(
    /// A slash command, component or modal interaction.
    interaction => "Interaction" {
        id("id"),
        id("application_id"),
        int("type"),
        json("data"),
        id("guild_id"),
        id("channel_id"),
        field("member", FieldType::model(guild_member)),
        field("user", FieldType::model(user)),
        text("token"),
        int("version"),
        field("message", FieldType::model(message)),
        text("locale"),
        text("guild_locale"),
    }
);

schema!(application_command_option_choice => "ApplicationCommandOptionChoice" {
    text("name"),
    json("value"),
});

schema!(application_command_option => "ApplicationCommandOption" {
    int("type"),
    text("name"),
    text("description"),
    flag("required", false),
    field("choices", FieldType::list_of(application_command_option_choice)),
    field("options", FieldType::list_of(application_command_option)),
});

schema!(application_command => "ApplicationCommand" {
    id("id"),
    int("type"),
    id("application_id"),
    id("guild_id"),
    text("name"),
    text("description"),
    field("options", FieldType::list_of(application_command_option)),
    field("default_member_permissions", FieldType::Permissions),
    boolean("nsfw"),
    id("version"),
});

schema!(application_command_permission => "ApplicationCommandPermission" {
    id("id"),
    int("type"),
    boolean("permission"),
});

schema!(application_command_permissions => "ApplicationCommandPermissions" {
    id("id"),
    id("application_id"),
    id("guild_id"),
    field("permissions", FieldType::list_of(application_command_permission)),
});

// ─── Moderation, audit, monetization, soundboard ───────────────────

schema!(auto_moderation_action => "AutoModerationAction" {
    int("type"),
    json("metadata"),
});

schema!(auto_moderation_rule => "AutoModerationRule" {
    id("id"),
    id("guild_id"),
    text("name"),
    id("creator_id"),
    int("event_type"),
    int("trigger_type"),
    json("trigger_metadata"),
    field("actions", FieldType::list_of(auto_moderation_action)),
    boolean("enabled"),
    ids("exempt_roles"),
    ids("exempt_channels"),
});

schema!(auto_moderation_action_execute => "AutoModerationActionExecute" {
    id("guild_id"),
    field("action", FieldType::model(auto_moderation_action)),
    id("rule_id"),
    int("rule_trigger_type"),
    id("user_id"),
    id("channel_id"),
    id("message_id"),
    id("alert_system_message_id"),
    text("content"),
    text("matched_keyword"),
    text("matched_content"),
});

schema!(audit_log_change => "AuditLogChange" {
    text("key"),
    json("new_value"),
    json("old_value"),
});

schema!(audit_log_entry => "AuditLogEntry" {
    id("target_id"),
    field("changes", FieldType::list_of(audit_log_change)),
    id("user_id"),
    id("id"),
    int("action_type"),
    json("options"),
    text("reason"),
    id("guild_id"),
});

schema!(guild_entitlement => "GuildEntitlement" {
    id("id"),
    id("sku_id"),
    id("application_id"),
    id("user_id"),
    id("guild_id"),
    int("type"),
    boolean("deleted"),
    boolean("consumed"),
    timestamp("starts_at"),
    timestamp("ends_at"),
});

schema!(guild_soundboard_sound => "GuildSoundboardSound" {
    text("name"),
    id("sound_id"),
    field("volume", FieldType::Float),
    id("emoji_id"),
    text("emoji_name"),
    id("guild_id"),
    boolean("available"),
    field("user", FieldType::model(user)),
});
