table! {
    oauth_access_tokens (access_token) {
        access_token -> Text,
        client_id -> Text,
        user_id -> Nullable<Text>,
        expires -> Timestamptz,
        scope -> Nullable<Text>,
    }
}

table! {
    oauth_clients (client_id) {
        client_id -> Text,
        client_secret -> Text,
        redirect_uri -> Text,
        grant_types -> Text,
    }
}

table! {
    oauth_refresh_tokens (refresh_token) {
        refresh_token -> Text,
        client_id -> Text,
        user_id -> Nullable<Text>,
        expires -> Timestamptz,
        scope -> Nullable<Text>,
    }
}

table! {
    permissions (id) {
        id -> Int4,
        method -> Text,
        endpoint -> Text,
    }
}

table! {
    role_permissions (role_id, permission_id) {
        role_id -> Int4,
        permission_id -> Int4,
    }
}

table! {
    roles (id) {
        id -> Int4,
        name -> Text,
    }
}

table! {
    user_roles (user_id, role_id) {
        user_id -> Text,
        role_id -> Int4,
    }
}

table! {
    users (id) {
        id -> Text,
        username -> Text,
        email -> Nullable<Text>,
        telephone -> Nullable<Text>,
        password_hash -> Text,
    }
}

joinable!(oauth_access_tokens -> oauth_clients (client_id));
joinable!(oauth_refresh_tokens -> oauth_clients (client_id));
joinable!(role_permissions -> permissions (permission_id));
joinable!(role_permissions -> roles (role_id));
joinable!(user_roles -> roles (role_id));
joinable!(user_roles -> users (user_id));

allow_tables_to_appear_in_same_query!(
    oauth_access_tokens,
    oauth_clients,
    oauth_refresh_tokens,
    permissions,
    role_permissions,
    roles,
    user_roles,
    users,
);
