//! Every GraphQL operation the client issues, in one place.

macro_rules! profile_fields {
    () => {
        "id username bio avatar coverImage"
    };
}

macro_rules! post_fields {
    () => {
        "id userID content media createdAt updatedAt"
    };
}

macro_rules! comment_fields {
    () => {
        concat!("id postID userID content createdAt post { id userID } user { ", profile_fields!(), " }")
    };
}

macro_rules! like_fields {
    () => {
        concat!("id postID userID createdAt post { id userID } user { ", profile_fields!(), " }")
    };
}

macro_rules! follow_fields {
    () => {
        concat!("id followerID followedID createdAt follower { ", profile_fields!(), " }")
    };
}

macro_rules! chat_fields {
    () => {
        "id participants createdAt updatedAt"
    };
}

macro_rules! message_fields {
    () => {
        "id chatID senderID content createdAt"
    };
}

macro_rules! notification_fields {
    () => {
        "id type content isRead senderID receiverID postID createdAt"
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetUserProfile,
    ListUserProfiles,
    GetPost,
    ListPosts,
    PostsByUserId,
    CommentsByPostId,
    LikesByPostId,
    FollowsByFollowerId,
    ListChats,
    MessagesByChatIdAndCreatedAt,
    NotificationsByReceiverId,

    CreateUserProfile,
    CreatePost,
    DeletePost,
    CreateComment,
    DeleteComment,
    CreateLike,
    DeleteLike,
    CreateFollow,
    DeleteFollow,
    CreateChat,
    CreateMessage,
    UpdateNotification,

    OnCreatePost,
    OnCreateComment,
    OnCreateLike,
    OnCreateFollow,
    OnCreateMessage,
    OnCreateNotification,
}

impl Operation {
    pub fn kind(self) -> OperationKind {
        use Operation::*;
        match self {
            GetUserProfile | ListUserProfiles | GetPost | ListPosts | PostsByUserId
            | CommentsByPostId | LikesByPostId | FollowsByFollowerId | ListChats
            | MessagesByChatIdAndCreatedAt | NotificationsByReceiverId => OperationKind::Query,
            CreateUserProfile | CreatePost | DeletePost | CreateComment | DeleteComment
            | CreateLike | DeleteLike | CreateFollow | DeleteFollow | CreateChat
            | CreateMessage | UpdateNotification => OperationKind::Mutation,
            OnCreatePost | OnCreateComment | OnCreateLike | OnCreateFollow | OnCreateMessage
            | OnCreateNotification => OperationKind::Subscription,
        }
    }

    /// The operation name sent alongside the document.
    pub fn name(self) -> &'static str {
        use Operation::*;
        match self {
            GetUserProfile => "GetUserProfile",
            ListUserProfiles => "ListUserProfiles",
            GetPost => "GetPost",
            ListPosts => "ListPosts",
            PostsByUserId => "PostsByUserID",
            CommentsByPostId => "CommentsByPostID",
            LikesByPostId => "LikesByPostID",
            FollowsByFollowerId => "FollowsByFollowerID",
            ListChats => "ListChats",
            MessagesByChatIdAndCreatedAt => "MessagesByChatIDAndCreatedAt",
            NotificationsByReceiverId => "NotificationsByReceiverID",
            CreateUserProfile => "CreateUserProfile",
            CreatePost => "CreatePost",
            DeletePost => "DeletePost",
            CreateComment => "CreateComment",
            DeleteComment => "DeleteComment",
            CreateLike => "CreateLike",
            DeleteLike => "DeleteLike",
            CreateFollow => "CreateFollow",
            DeleteFollow => "DeleteFollow",
            CreateChat => "CreateChat",
            CreateMessage => "CreateMessage",
            UpdateNotification => "UpdateNotification",
            OnCreatePost => "OnCreatePost",
            OnCreateComment => "OnCreateComment",
            OnCreateLike => "OnCreateLike",
            OnCreateFollow => "OnCreateFollow",
            OnCreateMessage => "OnCreateMessage",
            OnCreateNotification => "OnCreateNotification",
        }
    }

    /// The field under `data` holding the result.
    pub fn root_field(self) -> &'static str {
        use Operation::*;
        match self {
            GetUserProfile => "getUserProfile",
            ListUserProfiles => "listUserProfiles",
            GetPost => "getPost",
            ListPosts => "listPosts",
            PostsByUserId => "postsByUserID",
            CommentsByPostId => "commentsByPostID",
            LikesByPostId => "likesByPostID",
            FollowsByFollowerId => "followsByFollowerID",
            ListChats => "listChats",
            MessagesByChatIdAndCreatedAt => "messagesByChatIDAndCreatedAt",
            NotificationsByReceiverId => "notificationsByReceiverID",
            CreateUserProfile => "createUserProfile",
            CreatePost => "createPost",
            DeletePost => "deletePost",
            CreateComment => "createComment",
            DeleteComment => "deleteComment",
            CreateLike => "createLike",
            DeleteLike => "deleteLike",
            CreateFollow => "createFollow",
            DeleteFollow => "deleteFollow",
            CreateChat => "createChat",
            CreateMessage => "createMessage",
            UpdateNotification => "updateNotification",
            OnCreatePost => "onCreatePost",
            OnCreateComment => "onCreateComment",
            OnCreateLike => "onCreateLike",
            OnCreateFollow => "onCreateFollow",
            OnCreateMessage => "onCreateMessage",
            OnCreateNotification => "onCreateNotification",
        }
    }

    pub fn document(self) -> &'static str {
        use Operation::*;
        match self {
            GetUserProfile => concat!(
                "query GetUserProfile($id: ID!) { getUserProfile(id: $id) { ",
                profile_fields!(),
                " } }"
            ),
            ListUserProfiles => concat!(
                "query ListUserProfiles($filter: ModelUserProfileFilterInput, $limit: Int, $nextToken: String) ",
                "{ listUserProfiles(filter: $filter, limit: $limit, nextToken: $nextToken) { items { ",
                profile_fields!(),
                " } nextToken } }"
            ),
            GetPost => concat!(
                "query GetPost($id: ID!) { getPost(id: $id) { ",
                post_fields!(),
                " } }"
            ),
            ListPosts => concat!(
                "query ListPosts($filter: ModelPostFilterInput, $limit: Int, $nextToken: String) ",
                "{ listPosts(filter: $filter, limit: $limit, nextToken: $nextToken) { items { ",
                post_fields!(),
                " } nextToken } }"
            ),
            PostsByUserId => concat!(
                "query PostsByUserID($userID: ID!, $sortDirection: ModelSortDirection, $limit: Int, $nextToken: String) ",
                "{ postsByUserID(userID: $userID, sortDirection: $sortDirection, limit: $limit, nextToken: $nextToken) { items { ",
                post_fields!(),
                " } nextToken } }"
            ),
            CommentsByPostId => concat!(
                "query CommentsByPostID($postID: ID!, $sortDirection: ModelSortDirection, $limit: Int, $nextToken: String) ",
                "{ commentsByPostID(postID: $postID, sortDirection: $sortDirection, limit: $limit, nextToken: $nextToken) { items { ",
                comment_fields!(),
                " } nextToken } }"
            ),
            LikesByPostId => concat!(
                "query LikesByPostID($postID: ID!, $limit: Int, $nextToken: String) ",
                "{ likesByPostID(postID: $postID, limit: $limit, nextToken: $nextToken) { items { ",
                like_fields!(),
                " } nextToken } }"
            ),
            FollowsByFollowerId => concat!(
                "query FollowsByFollowerID($followerID: ID!, $filter: ModelFollowFilterInput, $limit: Int, $nextToken: String) ",
                "{ followsByFollowerID(followerID: $followerID, filter: $filter, limit: $limit, nextToken: $nextToken) { items { ",
                follow_fields!(),
                " } nextToken } }"
            ),
            ListChats => concat!(
                "query ListChats($filter: ModelChatFilterInput, $limit: Int, $nextToken: String) ",
                "{ listChats(filter: $filter, limit: $limit, nextToken: $nextToken) { items { ",
                chat_fields!(),
                " } nextToken } }"
            ),
            MessagesByChatIdAndCreatedAt => concat!(
                "query MessagesByChatIDAndCreatedAt($chatID: ID!, $sortDirection: ModelSortDirection, $limit: Int, $nextToken: String) ",
                "{ messagesByChatIDAndCreatedAt(chatID: $chatID, sortDirection: $sortDirection, limit: $limit, nextToken: $nextToken) { items { ",
                message_fields!(),
                " } nextToken } }"
            ),
            NotificationsByReceiverId => concat!(
                "query NotificationsByReceiverID($receiverID: ID!, $sortDirection: ModelSortDirection, $filter: ModelNotificationFilterInput, $limit: Int, $nextToken: String) ",
                "{ notificationsByReceiverID(receiverID: $receiverID, sortDirection: $sortDirection, filter: $filter, limit: $limit, nextToken: $nextToken) { items { ",
                notification_fields!(),
                " } nextToken } }"
            ),
            CreateUserProfile => concat!(
                "mutation CreateUserProfile($input: CreateUserProfileInput!) { createUserProfile(input: $input) { ",
                profile_fields!(),
                " } }"
            ),
            CreatePost => concat!(
                "mutation CreatePost($input: CreatePostInput!) { createPost(input: $input) { ",
                post_fields!(),
                " } }"
            ),
            DeletePost => "mutation DeletePost($input: DeletePostInput!) { deletePost(input: $input) { id } }",
            CreateComment => concat!(
                "mutation CreateComment($input: CreateCommentInput!) { createComment(input: $input) { ",
                comment_fields!(),
                " } }"
            ),
            DeleteComment => "mutation DeleteComment($input: DeleteCommentInput!) { deleteComment(input: $input) { id } }",
            CreateLike => concat!(
                "mutation CreateLike($input: CreateLikeInput!) { createLike(input: $input) { ",
                like_fields!(),
                " } }"
            ),
            DeleteLike => "mutation DeleteLike($input: DeleteLikeInput!) { deleteLike(input: $input) { id } }",
            CreateFollow => concat!(
                "mutation CreateFollow($input: CreateFollowInput!) { createFollow(input: $input) { ",
                follow_fields!(),
                " } }"
            ),
            DeleteFollow => "mutation DeleteFollow($input: DeleteFollowInput!) { deleteFollow(input: $input) { id } }",
            CreateChat => concat!(
                "mutation CreateChat($input: CreateChatInput!) { createChat(input: $input) { ",
                chat_fields!(),
                " } }"
            ),
            CreateMessage => concat!(
                "mutation CreateMessage($input: CreateMessageInput!) { createMessage(input: $input) { ",
                message_fields!(),
                " } }"
            ),
            UpdateNotification => concat!(
                "mutation UpdateNotification($input: UpdateNotificationInput!) { updateNotification(input: $input) { ",
                notification_fields!(),
                " } }"
            ),
            OnCreatePost => concat!(
                "subscription OnCreatePost($filter: ModelSubscriptionPostFilterInput) { onCreatePost(filter: $filter) { ",
                post_fields!(),
                " } }"
            ),
            OnCreateComment => concat!(
                "subscription OnCreateComment($filter: ModelSubscriptionCommentFilterInput) { onCreateComment(filter: $filter) { ",
                comment_fields!(),
                " } }"
            ),
            OnCreateLike => concat!(
                "subscription OnCreateLike($filter: ModelSubscriptionLikeFilterInput) { onCreateLike(filter: $filter) { ",
                like_fields!(),
                " } }"
            ),
            OnCreateFollow => concat!(
                "subscription OnCreateFollow($filter: ModelSubscriptionFollowFilterInput) { onCreateFollow(filter: $filter) { ",
                follow_fields!(),
                " } }"
            ),
            OnCreateMessage => concat!(
                "subscription OnCreateMessage($filter: ModelSubscriptionMessageFilterInput) { onCreateMessage(filter: $filter) { ",
                message_fields!(),
                " } }"
            ),
            OnCreateNotification => concat!(
                "subscription OnCreateNotification($filter: ModelSubscriptionNotificationFilterInput) { onCreateNotification(filter: $filter) { ",
                notification_fields!(),
                " } }"
            ),
        }
    }
}
