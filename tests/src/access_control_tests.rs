use crate::common::{
    create_new_game,
    game::{CREATE_NEW_GAME, MAKE_MOVE},
    make_move, setup,
};
use ethers::types::{Address, Bytes, U256};
use warden_contracts::{Account, ContractError, ExecuteBatchCall};
use warden_entry_point::{EntryPointError, FailureKind, ValidationError};
use warden_primitives::{constants::validation::VALID_UNTIL_MAX, Event, Wallet};

#[test]
fn agent_calls_allowed_function_directly() -> eyre::Result<()> {
    let mut ctx = setup()?;
    ctx.bind_access_control()?;
    ctx.allow(CREATE_NEW_GAME)?;

    let (agent, account, game) = (ctx.agent.address(), ctx.account, ctx.game);
    let opponent = Address::random();
    let out = ctx.state().execute(
        agent,
        account,
        game,
        U256::zero(),
        create_new_game(account, opponent),
    )?;
    assert!(out.logs.iter().any(|l| l.name() == "GameCreated"));
    assert!(ctx
        .entry_point
        .state()
        .events()
        .iter()
        .any(|e| matches!(e, Event::AccountExecuted { target, .. } if *target == game)));

    let board = ctx.board(U256::zero())?;
    assert!(board.player1_turn());
    assert_eq!(board.state(), 0);
    Ok(())
}

#[test]
fn direct_call_rejections() -> eyre::Result<()> {
    let mut ctx = setup()?;
    ctx.bind_access_control()?;
    ctx.allow(CREATE_NEW_GAME)?;
    let (agent, account, game) = (ctx.agent.address(), ctx.account, ctx.game);
    let events = ctx.entry_point.state().events().len();

    // the avatar is not the controller once a module is bound
    let avatar = ctx.avatar.address();
    let err = ctx
        .state()
        .execute(avatar, account, game, U256::zero(), create_new_game(account, agent))
        .unwrap_err();
    assert!(matches!(err, ContractError::NotAuthorizedCall { caller, .. } if caller == avatar));

    // makeMove was never allow-listed
    let err = ctx
        .state()
        .execute(agent, account, game, U256::zero(), make_move(0, U256::zero()))
        .unwrap_err();
    assert!(matches!(err, ContractError::NotAuthorizedCall { .. }));

    assert_eq!(ctx.entry_point.state().events().len(), events);
    Ok(())
}

#[test]
fn owner_only_without_module() -> eyre::Result<()> {
    let mut ctx = setup()?;
    let (avatar, agent, account, game) =
        (ctx.avatar.address(), ctx.agent.address(), ctx.account, ctx.game);

    let err = ctx
        .state()
        .execute(agent, account, game, U256::zero(), create_new_game(account, agent))
        .unwrap_err();
    assert!(matches!(err, ContractError::NotAuthorized { caller } if caller == agent));

    ctx.state().execute(avatar, account, game, U256::zero(), create_new_game(account, agent))?;

    // the same rule holds for operations
    let uo = ctx.sign(&ctx.agent, ctx.user_op(create_new_game(account, agent)))?;
    let outcomes = ctx.entry_point.handle_ops(vec![uo], Address::random());
    assert_eq!(outcomes[0].error().map(|e| e.kind()), Some(FailureKind::NotAuthorizedCall));
    assert_eq!(outcomes[0].error().unwrap().to_string(), "FailedOp(0, \"AA24 signature error\")");

    let uo = ctx.sign(&ctx.avatar, ctx.user_op(create_new_game(account, agent)))?;
    let outcomes = ctx.entry_point.handle_ops(vec![uo], Address::random());
    assert!(outcomes[0].is_success());
    Ok(())
}

#[test]
fn agent_operation_through_entry_point() -> eyre::Result<()> {
    let mut ctx = setup()?;
    ctx.bind_access_control()?;
    ctx.allow(CREATE_NEW_GAME)?;

    let opponent = Address::random();
    let uo = ctx.sign(&ctx.agent, ctx.user_op(create_new_game(ctx.account, opponent)))?;
    let beneficiary = Address::random();
    let outcomes = ctx.entry_point.handle_ops(vec![uo.clone()], beneficiary);

    let receipt = outcomes[0].receipt().cloned().unwrap();
    assert!(receipt.success);
    assert_eq!(receipt.user_operation_hash, ctx.entry_point.get_user_op_hash(&uo));
    assert!(receipt.logs.iter().any(|l| l.name() == "GameCreated"));
    assert!(receipt.logs.iter().any(|l| l.name() == "UserOperationEvent"));
    assert_eq!(ctx.entry_point.get_nonce(&ctx.account), U256::one());
    assert_eq!(ctx.entry_point.state().balance(&beneficiary), receipt.actual_gas_cost);
    assert_eq!(
        ctx.entry_point.balance_of(&ctx.account),
        U256::from(crate::common::ACCOUNT_DEPOSIT) - receipt.actual_gas_cost
    );
    Ok(())
}

#[test]
fn agent_operation_with_disallowed_function() -> eyre::Result<()> {
    let mut ctx = setup()?;
    ctx.bind_access_control()?;
    ctx.allow(CREATE_NEW_GAME)?;

    let uo = ctx.sign(&ctx.agent, ctx.user_op(make_move(0, U256::zero())))?;
    let outcomes = ctx.entry_point.handle_ops(vec![uo], Address::random());
    match outcomes[0].error() {
        Some(EntryPointError::FailedOp {
            index: 0,
            error: ValidationError::SignatureFailed { rejection: Some(rejection) },
        }) => assert!(matches!(rejection, ContractError::NotAuthorizedCall { .. })),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(ctx.entry_point.get_nonce(&ctx.account), U256::zero());
    assert_eq!(ctx.entry_point.balance_of(&ctx.account), crate::common::ACCOUNT_DEPOSIT.into());
    Ok(())
}

#[test]
fn simulated_validation_reports_failed_signature() -> eyre::Result<()> {
    let ctx = setup()?;
    let uo = ctx
        .user_op(create_new_game(ctx.account, Address::random()))
        .max_fee_per_gas(U256::zero())
        .max_priority_fee_per_gas(U256::zero());

    let stranger = Wallet::random();
    let res = ctx.entry_point.simulate_validation(&ctx.sign(&stranger, uo.clone())?)?;
    assert!(res.return_info.sig_failed);
    assert_eq!(res.return_info.valid_after, 0);
    assert_eq!(res.return_info.valid_until, VALID_UNTIL_MAX);
    assert_eq!(res.return_info.valid_until, 281474976710655);
    assert_eq!(res.return_info.prefund, U256::zero());
    assert_eq!(res.sender_info.addr, ctx.account);

    let res = ctx.entry_point.simulate_validation(&ctx.sign(&ctx.avatar, uo)?)?;
    assert!(!res.return_info.sig_failed);
    assert_eq!(ctx.entry_point.get_nonce(&ctx.account), U256::zero());
    Ok(())
}

#[test]
fn target_scoped_function() -> eyre::Result<()> {
    let mut ctx = setup()?;
    ctx.bind_access_control()?;
    let (agent, account, module, game) = (ctx.agent.address(), ctx.account, ctx.module, ctx.game);
    ctx.state().set_valid_target_function(agent, module, game, CREATE_NEW_GAME, true)?;

    ctx.state().execute(agent, account, game, U256::zero(), create_new_game(account, agent))?;

    // same selector on another target
    let elsewhere = Address::random();
    let err = ctx
        .state()
        .execute(agent, account, elsewhere, U256::zero(), create_new_game(account, agent))
        .unwrap_err();
    assert!(matches!(err, ContractError::NotAuthorizedCall { target, .. } if target == elsewhere));
    Ok(())
}

#[test]
fn revoked_function() -> eyre::Result<()> {
    let mut ctx = setup()?;
    ctx.bind_access_control()?;
    ctx.allow(CREATE_NEW_GAME)?;
    let (agent, account, module, game) = (ctx.agent.address(), ctx.account, ctx.module, ctx.game);

    ctx.state().set_valid_function(agent, module, CREATE_NEW_GAME, false)?;
    let err = ctx
        .state()
        .execute(agent, account, game, U256::zero(), create_new_game(account, agent))
        .unwrap_err();
    assert!(matches!(err, ContractError::NotAuthorizedCall { .. }));

    // only the controller edits the allow-list
    let avatar = ctx.avatar.address();
    let err = ctx.state().set_valid_function(avatar, module, CREATE_NEW_GAME, true).unwrap_err();
    assert!(matches!(err, ContractError::Unauthorized { .. }));
    Ok(())
}

#[test]
fn batch_is_all_or_nothing() -> eyre::Result<()> {
    let mut ctx = setup()?;
    ctx.bind_access_control()?;
    ctx.allow(CREATE_NEW_GAME)?;
    ctx.allow(MAKE_MOVE)?;
    let (agent, account, game) = (ctx.agent.address(), ctx.account, ctx.game);
    let opponent = Address::random();

    // the move is out of turn: the account is player 2
    let err = ctx
        .state()
        .execute_batch(
            agent,
            account,
            vec![game, game],
            vec![create_new_game(opponent, account), make_move(0, U256::zero())],
        )
        .unwrap_err();
    assert_eq!(err.to_string(), ContractError::reverted("Not your turn").to_string());
    assert!(ctx.board(U256::zero()).is_err());

    let outputs = ctx.state().execute_batch(
        agent,
        account,
        vec![game, game],
        vec![create_new_game(account, opponent), make_move(4, U256::zero())],
    )?;
    assert_eq!(outputs.len(), 2);
    let board = ctx.board(U256::zero())?;
    assert_eq!(board.cell(4), 1);
    assert!(!board.player1_turn());
    Ok(())
}

#[test]
fn batch_operation_reverts_as_a_whole() -> eyre::Result<()> {
    let mut ctx = setup()?;
    ctx.bind_access_control()?;
    ctx.allow(CREATE_NEW_GAME)?;
    ctx.allow(MAKE_MOVE)?;
    let opponent = Address::random();

    let call_data: Bytes = ethers::abi::AbiEncode::encode(ExecuteBatchCall {
        dest: vec![ctx.game, ctx.game],
        func: vec![create_new_game(opponent, ctx.account), make_move(0, U256::zero())],
    })
    .into();
    let uo = ctx.sign(&ctx.agent, ctx.user_op(Bytes::default()).call_data(call_data))?;
    let outcomes = ctx.entry_point.handle_ops(vec![uo], Address::random());

    let receipt = outcomes[0].receipt().unwrap();
    assert!(!receipt.success);
    assert!(matches!(outcomes[0].error(), Some(EntryPointError::Execution { index: 0, .. })));
    assert!(!receipt.logs.iter().any(|l| l.name() == "GameCreated"));
    assert!(receipt.logs.iter().any(|l| l.name() == "UserOperationRevertReason"));
    assert!(ctx.board(U256::zero()).is_err());
    // the nonce is consumed and the gas is paid
    assert_eq!(ctx.entry_point.get_nonce(&ctx.account), U256::one());
    assert!(!receipt.actual_gas_cost.is_zero());
    Ok(())
}

#[test]
fn module_binding_is_permanent() -> eyre::Result<()> {
    let mut ctx = setup()?;
    let sig_a = ctx.avatar.sign_digest(Account::access_control_digest(ctx.module))?;
    ctx.bind_access_control()?;

    let (deployer, account, module) = (ctx.deployer, ctx.account, ctx.module);
    let successor = Wallet::random();
    let other = ctx.state().deploy_access_control(deployer, successor.address(), account);
    let sig_b = ctx.avatar.sign_digest(Account::access_control_digest(other))?;
    let err = ctx.state().set_access_control(account, other, &sig_b).unwrap_err();
    assert_eq!(err, ContractError::AccessControlAlreadySet { account, module });

    // resubmitting the first signature is refused too
    let err = ctx.state().set_access_control(account, module, &sig_a).unwrap_err();
    assert!(matches!(err, ContractError::AccessControlAlreadySet { .. }));
    assert_eq!(ctx.entry_point.state().account(&account).unwrap().access_control(), Some(module));

    ctx.allow(CREATE_NEW_GAME)?;
    let uo = ctx.sign(&successor, ctx.user_op(create_new_game(account, Address::random())))?;
    let outcomes = ctx.entry_point.handle_ops(vec![uo], Address::random());
    assert_eq!(outcomes[0].error().map(|e| e.kind()), Some(FailureKind::NotAuthorizedCall));
    Ok(())
}

#[test]
fn target_carved_out_of_wildcard() -> eyre::Result<()> {
    let mut ctx = setup()?;
    ctx.bind_access_control()?;
    ctx.allow(CREATE_NEW_GAME)?;
    let (agent, account, module, game) = (ctx.agent.address(), ctx.account, ctx.module, ctx.game);
    ctx.state().set_valid_target_function(agent, module, game, CREATE_NEW_GAME, false)?;

    let uo = ctx.sign(&ctx.agent, ctx.user_op(create_new_game(account, agent)))?;
    let outcomes = ctx.entry_point.handle_ops(vec![uo], Address::random());
    assert_eq!(outcomes[0].error().map(|e| e.kind()), Some(FailureKind::NotAuthorizedCall));
    assert!(ctx.board(U256::zero()).is_err());
    Ok(())
}
